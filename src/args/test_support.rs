use clap::Parser;

use crate::error::{AppError, AppResult};

use super::ControlArgs;

pub(crate) fn parse_test_args<I, T>(args: I) -> AppResult<ControlArgs>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    ControlArgs::try_parse_from(args).map_err(AppError::from)
}
