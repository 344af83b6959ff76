//! Input validation module.
//!
//! Every value that ends up interpolated into a shell command line is
//! validated here first.

mod name;

pub use name::{
    validate_account_name, validate_group_list, validate_public_key, validate_target_user,
};
