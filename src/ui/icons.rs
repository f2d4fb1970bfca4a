//! Shared UI icons and emojis.
//!
//! Each icon carries an ASCII fallback for terminals without emoji support.

use console::Emoji;

// Status indicators
pub static PENDING: Emoji<'_, '_> = Emoji("⏳ ", "[..]");
pub static GENERATING: Emoji<'_, '_> = Emoji("🔄 ", "[>>]");
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");

// Section headers
pub static LIST: Emoji<'_, '_> = Emoji("📋 ", "");
pub static STATS: Emoji<'_, '_> = Emoji("📈 ", "");
pub static FILTER: Emoji<'_, '_> = Emoji("🔍 ", "");
pub static WATCH: Emoji<'_, '_> = Emoji("👀 ", "");
pub static FILE: Emoji<'_, '_> = Emoji("📄 ", "");
