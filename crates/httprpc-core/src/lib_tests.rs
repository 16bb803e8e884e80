#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// LogLevel tests

#[test]
fn LogLevel___ordering___trace_less_than_debug() {
    assert!(LogLevel::Trace < LogLevel::Debug);
}

#[test]
fn LogLevel___ordering___warn_less_than_error() {
    assert!(LogLevel::Warn < LogLevel::Error);
}

#[test]
fn LogLevel___ordering___error_less_than_off() {
    assert!(LogLevel::Error < LogLevel::Off);
}

#[test_case("trace", LogLevel::Trace)]
#[test_case("DEBUG", LogLevel::Debug)]
#[test_case("Info", LogLevel::Info)]
#[test_case("warning", LogLevel::Warn)]
#[test_case("error", LogLevel::Error)]
#[test_case("none", LogLevel::Off)]
fn LogLevel___from_str___accepts_any_case(input: &str, expected: LogLevel) {
    assert_eq!(input.parse::<LogLevel>().unwrap(), expected);
}

#[test]
fn LogLevel___from_str___rejects_unknown() {
    let result = "verbose".parse::<LogLevel>();

    assert!(result.is_err());
}

#[test]
fn LogLevel___display___shows_uppercase() {
    assert_eq!(LogLevel::Trace.to_string(), "TRACE");
    assert_eq!(LogLevel::Off.to_string(), "OFF");
}

#[test]
fn LogLevel___display_then_parse___is_identity() {
    for level in [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Off,
    ] {
        assert_eq!(level.to_string().parse::<LogLevel>().unwrap(), level);
    }
}
