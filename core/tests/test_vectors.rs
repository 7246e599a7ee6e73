//! Verify build/parse against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector describes an input, the expected request, a simulated
//! response and either the expected output or the expected error kind.
//! Bodies are compared as parsed JSON so key order does not matter.

use firstpromoter::{Client, Error, HttpResponse, TrackSignUpInput, TrackSignUpOutput};
use http::{Method, StatusCode};

const BASE_URL: &str = "http://localhost:3000";

#[test]
fn track_signup_test_vectors() {
    let raw = include_str!("../../test-vectors/track_signup.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    let c = Client::new(
        vectors["account_id"].as_str().unwrap(),
        vectors["api_key"].as_str().unwrap(),
        (),
    )
    .with_base_url(BASE_URL);

    let cases = vectors["cases"].as_array().unwrap();
    assert!(!cases.is_empty());

    for case in cases {
        let name = case["name"].as_str().unwrap();
        let input: TrackSignUpInput = serde_json::from_value(case["input"].clone()).unwrap();
        let expected_req = &case["expected_request"];

        // Verify build
        let req = c.build_track_sign_up(&input).unwrap();
        let method: Method = expected_req["method"].as_str().unwrap().parse().unwrap();
        assert_eq!(req.method, method, "{name}: method");
        assert_eq!(req.url, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: url");

        let expected_headers: Vec<(String, String)> = expected_req["headers"]
            .as_array()
            .unwrap()
            .iter()
            .map(|h| {
                let arr = h.as_array().unwrap();
                (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
            })
            .collect();
        assert_eq!(req.headers, expected_headers, "{name}: headers");

        let req_body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(req_body, expected_req["body"], "{name}: body");

        // Verify parse
        let sim = &case["simulated_response"];
        let status = StatusCode::from_u16(sim["status"].as_u64().unwrap() as u16).unwrap();
        let response = HttpResponse::new(status, sim["body"].as_str().unwrap().to_string());
        let result = c.parse_track_sign_up(response);

        if let Some(expected_error) = case.get("expected_error") {
            let err = result.unwrap_err();
            match expected_error.as_str().unwrap() {
                "status" => assert_eq!(err.status(), Some(status), "{name}: {err}"),
                "timestamp" => assert!(matches!(err, Error::Timestamp { .. }), "{name}: {err}"),
                "decode" => assert!(matches!(err, Error::Decode(_)), "{name}: {err}"),
                other => panic!("unknown expected_error: {other}"),
            }
        } else {
            let output = result.unwrap();
            let expected: TrackSignUpOutput = serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(output, expected, "{name}: parsed result");
        }
    }
}
