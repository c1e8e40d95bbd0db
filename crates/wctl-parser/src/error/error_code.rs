//! Error codes for wctl diagnostics.
//!
//! Codes are grouped by the phase that reports them:
//! - `E0xx` - Lexer errors
//! - `E1xx` - Grammar errors
//! - `E2xx` - Definition validation errors
//! - `E3xx` - Reference resolution errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Lexer Errors (E0xx)
    // =========================================================================
    /// A string was opened with a quote but never closed on the same line.
    E001,

    /// A character that starts no token.
    E002,

    /// An unrecognized escape sequence in a string literal.
    E003,

    /// An integer literal that does not fit in 64 bits.
    E004,

    // =========================================================================
    // Grammar Errors (E1xx)
    // =========================================================================
    /// The parser encountered a token it did not expect at this position.
    E100,

    /// The input ended before a complete declaration was parsed.
    E101,

    /// The file does not start with a `package` declaration.
    E102,

    /// A declaration name is not lowercase `[a-z][a-z0-9_]*`.
    E103,

    /// An option name is not lowercase, has no `.`, or has consecutive dots.
    E104,

    /// A field type is neither a base type nor a valid custom type name.
    E105,

    /// A field tag outside 1..=255.
    E106,

    /// A map key that is binary or not a base type.
    E107,

    /// A map value that is itself a container.
    E108,

    /// An enum value that is not an integer or that carries options.
    E109,

    /// A list of containers.
    E110,

    /// A method request or reply that is not a custom message type.
    E111,

    /// A protobuf `syntax` other than `proto2` or `proto3`.
    E112,

    // =========================================================================
    // Validation Errors (E2xx)
    // =========================================================================
    /// The same file is imported twice.
    E200,

    /// The same alias is used by two imports.
    E201,

    /// Programs imported under one reference name declare different packages.
    E202,

    /// A top-level name (message, enum, service or project) is defined twice.
    E203,

    /// A field, enum value or method name is repeated in its scope.
    E204,

    /// A field tag, enum number or method id is repeated in its scope.
    E205,

    /// An option key is repeated in its scope.
    E206,

    /// A method without an id while ID-based dispatch is enabled.
    E207,

    // =========================================================================
    // Resolution Errors (E3xx)
    // =========================================================================
    /// A custom type names no message or enum in scope.
    E300,

    /// A protobuf `rpc` request or reply names no message.
    E301,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E004 => "E004",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E103 => "E103",
            ErrorCode::E104 => "E104",
            ErrorCode::E105 => "E105",
            ErrorCode::E106 => "E106",
            ErrorCode::E107 => "E107",
            ErrorCode::E108 => "E108",
            ErrorCode::E109 => "E109",
            ErrorCode::E110 => "E110",
            ErrorCode::E111 => "E111",
            ErrorCode::E112 => "E112",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E204 => "E204",
            ErrorCode::E205 => "E205",
            ErrorCode::E206 => "E206",
            ErrorCode::E207 => "E207",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "unterminated string literal",
            ErrorCode::E002 => "unexpected character",
            ErrorCode::E003 => "invalid escape sequence",
            ErrorCode::E004 => "invalid integer literal",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "incomplete input",
            ErrorCode::E102 => "missing package declaration",
            ErrorCode::E103 => "invalid identifier",
            ErrorCode::E104 => "invalid option name",
            ErrorCode::E105 => "invalid field type",
            ErrorCode::E106 => "field tag out of range",
            ErrorCode::E107 => "invalid map key",
            ErrorCode::E108 => "invalid map value",
            ErrorCode::E109 => "invalid enum value",
            ErrorCode::E110 => "nested container",
            ErrorCode::E111 => "invalid method message",
            ErrorCode::E112 => "unsupported syntax version",
            ErrorCode::E200 => "duplicate import file",
            ErrorCode::E201 => "duplicate import alias",
            ErrorCode::E202 => "import package mismatch",
            ErrorCode::E203 => "duplicate definition",
            ErrorCode::E204 => "duplicate member name",
            ErrorCode::E205 => "duplicate number",
            ErrorCode::E206 => "duplicate option",
            ErrorCode::E207 => "missing method id",
            ErrorCode::E300 => "unresolved type",
            ErrorCode::E301 => "unresolved method message",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
