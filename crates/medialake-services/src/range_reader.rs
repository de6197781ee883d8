//! Pull-based range streaming
//!
//! Serves one stored object as a sequence of bounded ranged reads. One
//! inclusive window is fetched per pull and nothing is prefetched, so a
//! stalled client holds no buffered bytes beyond its current chunk.

use std::sync::Arc;

use bytes::Bytes;
use futures::Stream;
use medialake_core::models::Bucket;
use medialake_core::AppError;
use medialake_storage::ObjectGateway;

pub struct RangeStreamReader {
    gateway: Arc<dyn ObjectGateway>,
    bucket: Bucket,
    key: String,
    total_length: u64,
    chunk_size: u64,
    cursor: u64,
    explicit: Option<(u64, u64)>,
    done: bool,
}

impl RangeStreamReader {
    /// Open a reader over `(bucket, key)`.
    ///
    /// A `Range` header of the form `bytes=N-M` or `bytes=N-` pins the
    /// reader to exactly that window (one chunk total); otherwise reading
    /// starts at `start_position` and auto-chunks with `chunk_size`.
    /// A missing object is `NotFound`; a malformed or unsatisfiable header
    /// is `BadRequest`.
    pub async fn open(
        gateway: Arc<dyn ObjectGateway>,
        bucket: Bucket,
        key: String,
        start_position: u64,
        range_header: Option<&str>,
        chunk_size: u64,
    ) -> Result<Self, AppError> {
        let total_length = gateway.content_length(bucket, &key).await?;
        let explicit = match range_header {
            Some(header) => Some(parse_range_header(header, total_length)?),
            None => None,
        };
        let cursor = match explicit {
            Some((start, _)) => start,
            None => start_position,
        };
        Ok(Self {
            gateway,
            bucket,
            key,
            total_length,
            chunk_size,
            cursor,
            explicit,
            done: false,
        })
    }

    pub fn total_length(&self) -> u64 {
        self.total_length
    }

    /// Number of bytes the reader will serve from its current position.
    pub fn remaining_length(&self) -> u64 {
        match self.explicit {
            Some((start, end)) => end - start + 1,
            None => self.total_length.saturating_sub(self.cursor),
        }
    }

    /// `Content-Range` value for a 206 response, present when an explicit
    /// range is being served.
    pub fn content_range(&self) -> Option<String> {
        self.explicit
            .map(|(start, end)| format!("bytes {}-{}/{}", start, end, self.total_length))
    }

    /// Fetch the next window. `None` ends the sequence; a read failure
    /// yields one final `Err` and the sequence is destroyed.
    pub async fn next_chunk(&mut self) -> Option<Result<Bytes, AppError>> {
        if self.done || self.total_length == 0 {
            return None;
        }
        let last = self.total_length - 1;
        let (start, end) = match self.explicit {
            // Explicit ranges serve exactly one window.
            Some(window) => {
                self.done = true;
                window
            }
            None => {
                if self.cursor > last {
                    self.done = true;
                    return None;
                }
                let end = (self.cursor + self.chunk_size.saturating_sub(1)).min(last);
                let window = (self.cursor, end);
                self.cursor = end + 1;
                window
            }
        };

        match self
            .gateway
            .get_range(self.bucket, &self.key, start, end)
            .await
        {
            Ok(bytes) => Some(Ok(bytes)),
            Err(err) => {
                self.done = true;
                Some(Err(AppError::StreamRead(format!(
                    "Range [{}, {}] of {} failed: {}",
                    start, end, self.key, err
                ))))
            }
        }
    }

    /// Adapt the reader into a lazy `futures::Stream` of chunks; one
    /// ranged get is issued per poll cycle.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, AppError>> + Send {
        futures::stream::unfold(self, |mut reader| async move {
            reader.next_chunk().await.map(|chunk| (chunk, reader))
        })
    }
}

/// Parse `bytes=N-M` or `bytes=N-` against the object size. An open end is
/// closed with the last byte offset; `M` past the end is clamped. Suffix
/// ranges (`bytes=-N`) are not supported.
fn parse_range_header(header: &str, total_length: u64) -> Result<(u64, u64), AppError> {
    let spec = header
        .strip_prefix("bytes=")
        .ok_or_else(|| AppError::BadRequest(format!("Unsupported range unit: {}", header)))?;
    let (start, end) = spec
        .split_once('-')
        .ok_or_else(|| AppError::BadRequest(format!("Malformed range: {}", header)))?;

    let start: u64 = start
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Malformed range: {}", header)))?;

    let last = total_length.saturating_sub(1);
    let end = match end.trim() {
        "" => last,
        end => end
            .parse::<u64>()
            .map_err(|_| AppError::BadRequest(format!("Malformed range: {}", header)))?
            .min(last),
    };

    if total_length == 0 || start > end {
        return Err(AppError::BadRequest(format!(
            "Range {} not satisfiable for {} bytes",
            header, total_length
        )));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use medialake_core::config::{BucketTable, StorageConfig};
    use medialake_core::StorageBackend;
    use medialake_storage::create_gateway;

    async fn gateway_with_object(key: &str, data: &'static [u8]) -> Arc<dyn ObjectGateway> {
        let config = StorageConfig {
            backend: StorageBackend::Memory,
            buckets: BucketTable {
                images: "images".to_string(),
                docs: "docs".to_string(),
                videos: "videos".to_string(),
                tmp: "tmp".to_string(),
            },
            s3_region: None,
            s3_endpoint: None,
            local_storage_path: None,
        };
        let gateway = create_gateway(&config).await.unwrap();
        gateway
            .put(
                Bucket::Videos,
                key,
                "application/octet-stream",
                Bytes::from_static(data),
            )
            .await
            .unwrap();
        gateway
    }

    async fn drain(reader: &mut RangeStreamReader) -> Vec<Bytes> {
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().await {
            chunks.push(chunk.unwrap());
        }
        chunks
    }

    #[tokio::test]
    async fn test_auto_chunks_are_contiguous_and_end() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let mut reader =
            RangeStreamReader::open(gateway, Bucket::Videos, "v.bin".to_string(), 0, None, 4)
                .await
                .unwrap();

        assert_eq!(reader.total_length(), 10);
        assert!(reader.content_range().is_none());

        let chunks = drain(&mut reader).await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(&chunks[0][..], b"0123");
        assert_eq!(&chunks[1][..], b"4567");
        assert_eq!(&chunks[2][..], b"89");

        // Exhausted readers stay exhausted.
        assert!(reader.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_start_position_seeds_cursor() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let mut reader =
            RangeStreamReader::open(gateway, Bucket::Videos, "v.bin".to_string(), 6, None, 100)
                .await
                .unwrap();

        assert_eq!(reader.remaining_length(), 4);
        let chunks = drain(&mut reader).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], b"6789");
    }

    #[tokio::test]
    async fn test_explicit_range_serves_exactly_one_chunk() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let mut reader = RangeStreamReader::open(
            gateway,
            Bucket::Videos,
            "v.bin".to_string(),
            0,
            Some("bytes=2-5"),
            4,
        )
        .await
        .unwrap();

        assert_eq!(reader.content_range().as_deref(), Some("bytes 2-5/10"));
        assert_eq!(reader.remaining_length(), 4);

        let chunks = drain(&mut reader).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], b"2345");
    }

    #[tokio::test]
    async fn test_open_ended_range_closed_with_last_offset() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let mut reader = RangeStreamReader::open(
            gateway,
            Bucket::Videos,
            "v.bin".to_string(),
            0,
            Some("bytes=3-"),
            4,
        )
        .await
        .unwrap();

        assert_eq!(reader.content_range().as_deref(), Some("bytes 3-9/10"));
        let chunks = drain(&mut reader).await;
        assert_eq!(chunks.len(), 1);
        assert_eq!(&chunks[0][..], b"3456789");
    }

    #[tokio::test]
    async fn test_range_end_clamped_to_object_size() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let reader = RangeStreamReader::open(
            gateway,
            Bucket::Videos,
            "v.bin".to_string(),
            0,
            Some("bytes=8-100"),
            4,
        )
        .await
        .unwrap();

        assert_eq!(reader.content_range().as_deref(), Some("bytes 8-9/10"));
    }

    #[tokio::test]
    async fn test_invalid_range_headers_rejected() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        for header in ["bytes=-5", "bits=0-1", "bytes=abc-5", "bytes=50-2"] {
            let err = RangeStreamReader::open(
                Arc::clone(&gateway),
                Bucket::Videos,
                "v.bin".to_string(),
                0,
                Some(header),
                4,
            )
            .await
            .err().unwrap();
            assert!(matches!(err, AppError::BadRequest(_)), "{}", header);
        }
    }

    #[tokio::test]
    async fn test_start_past_end_rejected() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let err = RangeStreamReader::open(
            gateway,
            Bucket::Videos,
            "v.bin".to_string(),
            0,
            Some("bytes=10-"),
            4,
        )
        .await
        .err().unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_object_not_found() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let err = RangeStreamReader::open(
            gateway,
            Bucket::Videos,
            "missing.bin".to_string(),
            0,
            None,
            4,
        )
        .await
        .err().unwrap();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_object_ends_immediately() {
        let gateway = gateway_with_object("empty.bin", b"").await;
        let mut reader = RangeStreamReader::open(
            gateway,
            Bucket::Videos,
            "empty.bin".to_string(),
            0,
            None,
            4,
        )
        .await
        .unwrap();
        assert!(reader.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_read_failure_destroys_sequence() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let mut reader = RangeStreamReader::open(
            Arc::clone(&gateway),
            Bucket::Videos,
            "v.bin".to_string(),
            0,
            None,
            4,
        )
        .await
        .unwrap();

        gateway.delete(Bucket::Videos, "v.bin").await.unwrap();

        let chunk = reader.next_chunk().await.unwrap();
        assert!(matches!(chunk, Err(AppError::StreamRead(_))));
        assert!(reader.next_chunk().await.is_none());
    }

    #[tokio::test]
    async fn test_into_stream_yields_all_bytes() {
        let gateway = gateway_with_object("v.bin", b"0123456789").await;
        let reader =
            RangeStreamReader::open(gateway, Bucket::Videos, "v.bin".to_string(), 0, None, 3)
                .await
                .unwrap();

        let collected: Vec<u8> = reader
            .into_stream()
            .map(|chunk| chunk.unwrap().to_vec())
            .concat()
            .await;
        assert_eq!(collected, b"0123456789");
    }
}
