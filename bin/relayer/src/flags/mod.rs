//! CLI flags shared by the subcommands.

mod globals;
pub(crate) use globals::GlobalArgs;
