use std::io;

use bytes::{Buf, Bytes};
use futures::stream::{StreamExt, TryStreamExt};
use warp::multipart::{FormData, Part};

use crate::errors::ProofingError;

/// The form field an upload must use.
pub const AUDIO_PART_NAME: &str = "audio";

/// An uploaded file as received.
#[derive(Debug)]
pub struct Upload {
    pub name: String,
    pub data: Vec<u8>,
}

/// Collects chunks of [`Part`].
pub async fn part_as_vec(raw: Part) -> Result<Vec<u8>, io::Error> {
    let vec_of_results = part_as_stream(raw).collect::<Vec<_>>().await;

    let vec_of_vecs = vec_of_results.into_iter().collect::<Result<Vec<_>, _>>()?;

    Ok(vec_of_vecs.concat())
}

/// Collects raw data from [`Part`].
pub fn part_as_stream(raw: Part) -> impl futures::Stream<Item = Result<Bytes, io::Error>> {
    raw.stream().map(|r| {
        r.map(|mut x| x.copy_to_bytes(x.remaining()))
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "could not retrieve chunk"))
    })
}

/// Finds the audio part of a submission and reads it. Other parts are
/// skipped.
pub async fn parse_upload(content: FormData) -> Result<Upload, ProofingError> {
    let mut parts = Box::pin(content.map_err(|_| ProofingError::MalformedFormSubmission));

    while let Some(part) = parts.try_next().await? {
        if part.name() != AUDIO_PART_NAME {
            continue;
        }

        let name = part
            .filename()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
            .ok_or(ProofingError::PartsMissing)?;

        let data = part_as_vec(part)
            .await
            .map_err(|_| ProofingError::MalformedFormSubmission)?;

        return Ok(Upload { name, data });
    }

    Err(ProofingError::PartsMissing)
}
