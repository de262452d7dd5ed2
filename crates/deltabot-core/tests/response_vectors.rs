//! Response line vector tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use deltabot_core::protocol::rpc::decode_response;
use deltabot_core::{BotError, NormalizedValue};

mod vector_loader;
use vector_loader::load;

#[test]
fn response_vectors() {
    let files = [
        "response_result.json",
        "response_error.json",
        "response_no_id.json",
        "response_foreign_id.json",
        "response_truncated.json",
    ];

    for f in files {
        let v = load(f);
        let decoded = decode_response(&v.line);

        if let Some(ex) = v.expect_decode_error {
            let e = decoded.expect_err("expected decode error");
            assert_eq!(e.kind().as_str(), ex.code, "vector={}", v.description);
            continue;
        }

        let resp = decoded.expect("expected decodable line");

        if let Some(ex) = v.expect_error {
            match resp.into_reply() {
                Err(e @ BotError::Remote { .. }) => {
                    assert_eq!(e.kind().as_str(), ex.code, "vector={}", v.description);
                    let BotError::Remote { code, message } = e else { unreachable!() };
                    assert_eq!(code, ex.remote_code, "vector={}", v.description);
                    assert_eq!(message, ex.message, "vector={}", v.description);
                }
                other => panic!("vector={}: expected remote error, got {other:?}", v.description),
            }
            continue;
        }

        let ex = v.expect.expect("missing expect block");
        assert_eq!(resp.request_id(), ex["id"].as_u64(), "vector={}", v.description);
        let result = NormalizedValue::new(resp.into_reply().unwrap());
        assert_eq!(result.as_value(), &ex["result"], "vector={}", v.description);
    }
}
