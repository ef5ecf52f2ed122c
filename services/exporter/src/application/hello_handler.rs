/// 疎通確認用ハンドラー
use serde_json::{Value, json};

/// 固定のHello応答を返す
pub fn hello_response() -> Value {
    json!({
        "statusCode": 200,
        "headers": {
            "Content-Type": "application/json; charset=utf-8"
        },
        "body": json!({ "message": "Hello!!" }).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hello_response() {
        let response = hello_response();

        assert_eq!(response["statusCode"], 200);
        assert_eq!(
            response["headers"]["Content-Type"],
            "application/json; charset=utf-8"
        );

        let body: Value = serde_json::from_str(response["body"].as_str().unwrap()).unwrap();
        assert_eq!(body, json!({ "message": "Hello!!" }));
    }
}
