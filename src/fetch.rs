//! Bounded-retry fetching and segment reassembly.
use std::fmt::{Display, Formatter};

use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::face::Face;
use crate::packet::{Data, Outcome, Request};
use crate::security::Validator;

/// What a fetch was for. Only used to label errors and log lines.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum FetchKind {
    Data,
    ContentKey,
    DecryptionKey,
    PublicParams,
}

impl Display for FetchKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchKind::Data => write!(f, "data"),
            FetchKind::ContentKey => write!(f, "content key"),
            FetchKind::DecryptionKey => write!(f, "decryption key"),
            FetchKind::PublicParams => write!(f, "public params"),
        }
    }
}

/// Expresses `request` until data arrives.
///
/// A timeout consumes one of `max_attempts` attempts and the same request is re-expressed; the
/// fetch fails with [`Error::Timeout`] once the budget is spent. A nack is final.
pub async fn fetch_with_retry<F: Face + ?Sized>(
    face: &F,
    request: &Request,
    kind: FetchKind,
    max_attempts: u32,
) -> Result<Data> {
    let mut remaining = max_attempts.max(1);
    loop {
        match face.express(request).await {
            Outcome::Data(data) => return Ok(data),
            Outcome::Nack(reason) => {
                info!("Nack for {} {} fetch: {}", request.name, kind, reason);
                return Err(Error::Nack {
                    name: request.name.clone(),
                    kind,
                    reason,
                });
            }
            Outcome::Timeout => {
                remaining -= 1;
                if remaining == 0 {
                    info!("Timeout for {} {} fetch, giving up", request.name, kind);
                    return Err(Error::Timeout {
                        name: request.name.clone(),
                        kind,
                    });
                }
                info!(
                    "Timeout for {} {} fetch, retrying ({} attempts left)",
                    request.name, kind, remaining
                );
            }
        }
    }
}

/// Fetches every segment of a segmented object and returns the concatenated content.
///
/// `request` names the object; its first segment is whatever the producer answers with. Each
/// segment is validated before the next one is requested.
pub async fn fetch_segmented<F, V>(
    face: &F,
    validator: &V,
    request: &Request,
    kind: FetchKind,
    max_attempts: u32,
) -> Result<Vec<u8>>
where
    F: Face + ?Sized,
    V: Validator + ?Sized,
{
    let first = fetch_with_retry(face, request, kind, max_attempts).await?;
    validate_segment(validator, &first).await?;

    let first_number = first
        .name
        .segment()
        .ok_or_else(|| Error::malformed("segment", format!("{} has no segment number", first.name)))?;
    if first_number != 0 {
        return Err(Error::malformed(
            "segment",
            format!("expected segment 0, got {}", first.name),
        ));
    }
    let final_block = first
        .final_block
        .ok_or_else(|| Error::malformed("segment", format!("{} has no final block", first.name)))?;

    let object_name = first.name.without_segment();
    let mut content = first.content;
    for number in 1..=final_block {
        let segment_request = Request::new(object_name.clone().append_segment(number))
            .with_must_be_fresh(request.must_be_fresh)
            .with_lifetime(request.lifetime);
        let segment = fetch_with_retry(face, &segment_request, kind, max_attempts).await?;
        validate_segment(validator, &segment).await?;

        if segment.name.segment() != Some(number) {
            return Err(Error::malformed(
                "segment",
                format!("expected segment {}, got {}", number, segment.name),
            ));
        }
        // a different final block means the producer re-issued the object mid-fetch
        if segment.final_block != Some(final_block) {
            return Err(Error::malformed(
                "segment",
                format!(
                    "{} ends at {:?}, segment 0 ended at {}",
                    segment.name, segment.final_block, final_block
                ),
            ));
        }
        content.extend_from_slice(&segment.content);
    }
    debug!(
        "Reassembled {} from {} segments ({} bytes)",
        object_name,
        final_block + 1,
        content.len()
    );
    Ok(content)
}

async fn validate_segment<V: Validator + ?Sized>(validator: &V, segment: &Data) -> Result<()> {
    validator
        .validate(segment)
        .await
        .map_err(|source| Error::Validation {
            subject: "Decryption key segment",
            source,
        })
}
