//! Launch token validation

use thiserror::Error;
use wakeguard_api::{SuppressionMode, TickInterval};
use wakeguard_util::WakeguardError;

use crate::{LaunchPlan, default_mode};

/// Launch argument errors. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("'{0}' is not a number. Pass an interval in seconds, /s to run, or /c for information.")]
    NotANumber(String),

    #[error("Interval {value} is out of range. Pass a whole number of seconds from {min} to {max}.")]
    OutOfRange { value: i64, min: u32, max: u32 },

    #[error("Unknown option '{0}'. Use /s to run, /p to run, or /c for information.")]
    UnknownSwitch(String),

    #[error("Too many arguments ({0}). Pass at most one.")]
    TooManyArguments(usize),
}

impl From<ArgumentError> for WakeguardError {
    fn from(err: ArgumentError) -> Self {
        WakeguardError::invalid_argument(err.to_string())
    }
}

/// Parse the positional launch arguments (program name excluded)
pub fn parse_launch_args<S: AsRef<str>>(args: &[S]) -> Result<LaunchPlan, ArgumentError> {
    match args {
        [] => Ok(LaunchPlan::Suppress(default_mode())),
        [token] => parse_token(token.as_ref()),
        _ => Err(ArgumentError::TooManyArguments(args.len())),
    }
}

/// Parse a single launch token
pub fn parse_token(token: &str) -> Result<LaunchPlan, ArgumentError> {
    let trimmed = token.trim();

    if trimmed.starts_with('/') {
        return parse_switch(trimmed);
    }

    let value: i64 = trimmed
        .parse()
        .map_err(|_| ArgumentError::NotANumber(token.to_string()))?;

    let interval = TickInterval::from_secs(value).map_err(|e| ArgumentError::OutOfRange {
        value: e.value,
        min: e.min,
        max: e.max,
    })?;

    Ok(LaunchPlan::Suppress(SuppressionMode::synthetic(interval)))
}

/// Match a slash switch on its first two characters, case-insensitively
fn parse_switch(token: &str) -> Result<LaunchPlan, ArgumentError> {
    let lowered = token.to_lowercase();
    let prefix: String = lowered.chars().take(2).collect();

    match prefix.as_str() {
        "/s" | "/p" => Ok(LaunchPlan::Suppress(SuppressionMode::Declarative)),
        "/c" => Ok(LaunchPlan::About),
        _ => {
            tracing::debug!(token = %token, "Rejected launch switch");
            Err(ArgumentError::UnknownSwitch(token.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_token_starts_synthetic() {
        let plan = parse_launch_args(&["45"]).unwrap();
        assert_eq!(
            plan,
            LaunchPlan::Suppress(SuppressionMode::synthetic(
                TickInterval::from_secs(45).unwrap()
            ))
        );
    }

    #[test]
    fn interval_bounds() {
        assert!(parse_launch_args(&["10"]).is_ok());
        assert!(parse_launch_args(&["3600"]).is_ok());
        assert!(matches!(
            parse_launch_args(&["3601"]),
            Err(ArgumentError::OutOfRange { value: 3601, .. })
        ));
    }

    #[test]
    fn short_interval_rejected() {
        assert_eq!(
            parse_launch_args(&["5"]),
            Err(ArgumentError::OutOfRange {
                value: 5,
                min: 10,
                max: 3600
            })
        );
    }

    #[test]
    fn negative_interval_is_out_of_range() {
        assert!(matches!(
            parse_launch_args(&["-5"]),
            Err(ArgumentError::OutOfRange { value: -5, .. })
        ));
    }

    #[test]
    fn whitespace_around_interval_is_ignored() {
        assert!(parse_launch_args(&[" 60 "]).is_ok());
    }

    #[test]
    fn non_numbers_rejected() {
        assert!(matches!(
            parse_launch_args(&["abc"]),
            Err(ArgumentError::NotANumber(_))
        ));
        assert!(matches!(
            parse_launch_args(&["12.5"]),
            Err(ArgumentError::NotANumber(_))
        ));
        assert!(matches!(
            parse_launch_args(&[""]),
            Err(ArgumentError::NotANumber(_))
        ));
    }

    #[test]
    fn show_switch_is_case_insensitive() {
        assert_eq!(
            parse_launch_args(&["/S"]).unwrap(),
            LaunchPlan::Suppress(SuppressionMode::Declarative)
        );
        assert_eq!(
            parse_launch_args(&["/s"]).unwrap(),
            LaunchPlan::Suppress(SuppressionMode::Declarative)
        );
    }

    #[test]
    fn preview_switch_runs_declarative() {
        assert_eq!(
            parse_launch_args(&["/p"]).unwrap(),
            LaunchPlan::Suppress(SuppressionMode::Declarative)
        );
    }

    #[test]
    fn configure_switch_matches_prefix() {
        assert_eq!(parse_launch_args(&["/c"]).unwrap(), LaunchPlan::About);
        assert_eq!(parse_launch_args(&["/C:1234"]).unwrap(), LaunchPlan::About);
    }

    #[test]
    fn unknown_switches_rejected() {
        assert_eq!(
            parse_launch_args(&["/x"]),
            Err(ArgumentError::UnknownSwitch("/x".into()))
        );
        assert!(matches!(
            parse_launch_args(&["/"]),
            Err(ArgumentError::UnknownSwitch(_))
        ));
    }

    #[test]
    fn no_argument_uses_default() {
        let empty: [&str; 0] = [];
        assert_eq!(
            parse_launch_args(&empty).unwrap(),
            LaunchPlan::Suppress(default_mode())
        );
    }

    #[test]
    fn too_many_arguments_rejected() {
        assert_eq!(
            parse_launch_args(&["/s", "45"]),
            Err(ArgumentError::TooManyArguments(2))
        );
    }

    #[test]
    fn errors_convert_to_invalid_argument() {
        let err: WakeguardError = ArgumentError::TooManyArguments(3).into();
        assert!(matches!(err, WakeguardError::InvalidArgument(_)));
    }
}
