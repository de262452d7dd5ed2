//! JSON test vector loader for response decoding tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]
#![allow(dead_code)]

use std::fs;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ResponseVector {
    pub description: String,
    pub line: String,
    #[serde(default)]
    pub expect: Option<serde_json::Value>,
    #[serde(default)]
    pub expect_error: Option<ExpectRemote>,
    #[serde(default)]
    pub expect_decode_error: Option<ExpectCode>,
}

#[derive(Debug, Deserialize)]
pub struct ExpectRemote {
    pub code: String,
    pub remote_code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ExpectCode {
    pub code: String,
}

pub fn load(name: &str) -> ResponseVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}
