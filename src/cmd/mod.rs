//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled   |
//! |----------|--------------------|
//! | `add`    | `Add`              |
//! | `list`   | `List`             |
//! | `status` | `Status`           |
//! | `show`   | `Show`, `Copy`     |
//! | `config` | `Config`           |

pub mod add;
pub mod config;
pub mod list;
pub mod show;
pub mod status;

pub use add::cmd_add;
pub use config::cmd_config;
pub use list::cmd_list;
pub use show::{cmd_copy, cmd_show};
pub use status::cmd_status;
