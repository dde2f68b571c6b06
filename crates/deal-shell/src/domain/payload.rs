//! JSON payloads exchanged across the repository boundary.
//!
//! Repositories speak in opaque byte payloads. These helpers are the only
//! place the shell and the bundled adapters turn domain values into bytes
//! and back.

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::{Comment, Deal};

/// Errors raised while encoding or decoding payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// A value could not be serialised.
    #[error("failed to encode {what} payload: {message}")]
    Encode {
        /// Kind of value being encoded.
        what: &'static str,
        /// Serialiser message.
        message: String,
    },
    /// Bytes did not describe a valid value.
    #[error("failed to decode {what} payload: {message}")]
    Decode {
        /// Kind of value being decoded.
        what: &'static str,
        /// Deserialiser message.
        message: String,
    },
}

fn encode<T: Serialize + ?Sized>(what: &'static str, value: &T) -> Result<Vec<u8>, PayloadError> {
    serde_json::to_vec(value).map_err(|err| PayloadError::Encode {
        what,
        message: err.to_string(),
    })
}

fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, PayloadError> {
    serde_json::from_slice(bytes).map_err(|err| PayloadError::Decode {
        what,
        message: err.to_string(),
    })
}

/// Encode a single deal.
pub fn encode_deal(deal: &Deal) -> Result<Vec<u8>, PayloadError> {
    encode("deal", deal)
}

/// Decode a single deal.
pub fn decode_deal(bytes: &[u8]) -> Result<Deal, PayloadError> {
    decode("deal", bytes)
}

/// Encode an ordered deal list.
pub fn encode_deals(deals: &[Deal]) -> Result<Vec<u8>, PayloadError> {
    encode("deal list", deals)
}

/// Decode an ordered deal list.
pub fn decode_deals(bytes: &[u8]) -> Result<Vec<Deal>, PayloadError> {
    decode("deal list", bytes)
}

/// Encode a single comment.
pub fn encode_comment(comment: &Comment) -> Result<Vec<u8>, PayloadError> {
    encode("comment", comment)
}

/// Decode a single comment.
pub fn decode_comment(bytes: &[u8]) -> Result<Comment, PayloadError> {
    decode("comment", bytes)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;
    use crate::domain::{CommentText, DealId, RequirementSize, TenantName};

    #[rstest]
    fn deal_list_keeps_order_and_fields() {
        let deals = vec![
            Deal::draft(
                RequirementSize::new(100).expect("valid size"),
                TenantName::new("Tenant 1").expect("valid tenant"),
            )
            .with_id(DealId::new(1)),
            Deal::draft(
                RequirementSize::new(200).expect("valid size"),
                TenantName::new("Tenant 2").expect("valid tenant"),
            )
            .with_id(DealId::new(2))
            .with_comment(Comment::new(CommentText::new("first").expect("valid text"))),
        ];

        let bytes = encode_deals(&deals).expect("encode list");
        let decoded = decode_deals(&bytes).expect("decode list");

        assert_eq!(decoded, deals);
    }

    #[rstest]
    fn comment_wire_shape_carries_null_id() {
        let comment = Comment::new(CommentText::new("note").expect("valid text"));
        let bytes = encode_comment(&comment).expect("encode comment");
        assert_eq!(bytes, br#"{"id":null,"text":"note"}"#);
    }

    #[rstest]
    #[case::not_json(b"not json".as_slice())]
    #[case::wrong_shape(br#"{"text": 4}"#.as_slice())]
    #[case::blank_text(br#"{"id": 1, "text": " "}"#.as_slice())]
    fn malformed_comment_is_a_decode_error(#[case] bytes: &[u8]) {
        let err = decode_comment(bytes).expect_err("malformed payload");
        assert!(matches!(err, PayloadError::Decode { what: "comment", .. }));
    }

    #[rstest]
    fn decode_error_names_the_payload() {
        let err = decode_deal(b"[]").expect_err("list is not a deal");
        assert!(err.to_string().starts_with("failed to decode deal payload"));
    }
}
