// Copyright (C) 2023 Tristan Gerritsen <tristan@thewoosh.org>
// All Rights Reserved.

//! Serving a file as the body of a response, honouring the `Range` header of
//! the request.
//!
//! # References
//! * [RFC 9110 Section 14](https://www.rfc-editor.org/rfc/rfc9110.html#name-range-requests)
//! * [RFC 9110 Section 14.6](https://www.rfc-editor.org/rfc/rfc9110.html#name-media-type-multipart-bytera)

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    io::SeekFrom,
    path::{Path, PathBuf},
    time::SystemTime,
};

use messaggero_http::{
    date::is_http_date,
    evaluate_range_header,
    ByteRange,
    ContentRangeHeaderValue,
    HeaderMap,
    HeaderName,
    RangeRequest,
};
use messaggero_resources::{magic::SNIFF_LENGTH, MediaType};
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, trace, warn};

use crate::{
    config::DownloadOptions,
    error::{Error, Result},
    transport::Transport,
};

/// How the file is going to be sent, decided once when the download is
/// attached to the response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferPlan {
    /// `200 OK` with the complete file.
    Normal,

    /// `206 Partial Content` with a single range.
    Single(ByteRange),

    /// `206 Partial Content` with a `multipart/x-byteranges` body.
    Multi {
        ranges: Vec<ByteRange>,
        boundary: String,
    },

    /// `416 Range Not Satisfiable` without a body.
    Unsatisfiable,
}

/// How the transfer of a body ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransferOutcome {
    Completed,

    /// The client went away, so the rest of the body was not sent.
    ClientDisconnected,
}

/// A file attached to a response. The handle opened for planning is the one
/// the body is read from.
#[derive(Debug)]
pub struct RangeDownload {
    file: File,
    path: PathBuf,
    size: u64,
    modified: Option<SystemTime>,
    media_type: MediaType,
    options: DownloadOptions,
    plan: TransferPlan,
}

impl RangeDownload {
    /// Opens the file and plans the transfer against the `Range` header of
    /// the request, if any.
    pub async fn open(path: impl AsRef<Path>, options: DownloadOptions, range_header: Option<&str>) -> Result<RangeDownload> {
        let path = path.as_ref();

        let mut file = match File::open(path).await {
            Ok(file) => file,
            Err(error) => {
                debug!("Can't open download {}: {error}", path.display());
                return Err(Error::InvalidFilePath(path.to_path_buf()));
            }
        };

        let metadata = file.metadata().await
            .map_err(|_| Error::StatResourceUnavailable(path.to_path_buf()))?;
        if !metadata.is_file() {
            return Err(Error::InvalidFilePath(path.to_path_buf()));
        }

        let size = metadata.len();
        let modified = metadata.modified().ok().filter(|modified| {
            let representable = is_http_date(*modified);
            if !representable {
                debug!("Modification time of {} can't be sent as Last-Modified", path.display());
            }
            representable
        });

        let mut prefix = [0; SNIFF_LENGTH];
        let mut prefix_length = 0;
        while prefix_length < prefix.len() {
            let read = file.read(&mut prefix[prefix_length..]).await?;
            if read == 0 {
                break;
            }
            prefix_length += read;
        }
        let media_type = MediaType::sniff(&prefix[..prefix_length], path);

        let plan = plan_transfer(path, size, options.accept_ranges, range_header);
        debug!("Download of {} ({size} bytes) planned as {plan:?}", path.display());

        Ok(RangeDownload {
            file,
            path: path.to_path_buf(),
            size,
            modified,
            media_type,
            options,
            plan,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn media_type(&self) -> &MediaType {
        &self.media_type
    }

    pub fn plan(&self) -> &TransferPlan {
        &self.plan
    }

    pub fn status_code(&self) -> u16 {
        match self.plan {
            TransferPlan::Normal => 200,
            TransferPlan::Single(_) | TransferPlan::Multi { .. } => 206,
            TransferPlan::Unsatisfiable => 416,
        }
    }

    /// The exact amount of bytes [`RangeDownload::transfer`] writes.
    pub fn content_length(&self) -> u64 {
        match &self.plan {
            TransferPlan::Normal => self.size,
            TransferPlan::Single(range) => range.length(),
            TransferPlan::Multi { ranges, boundary } => {
                let parts: u64 = ranges.iter()
                    .map(|range| self.part_header(boundary, *range).len() as u64 + range.length())
                    .sum();
                parts + closing_delimiter(boundary).len() as u64
            }
            TransferPlan::Unsatisfiable => 0,
        }
    }

    /// Sets the headers describing the body.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        headers.set(HeaderName::AcceptRanges, if self.options.accept_ranges { "bytes" } else { "none" });
        headers.set(HeaderName::ContentDisposition, self.content_disposition());
        if let Some(modified) = self.modified {
            headers.set_last_modified(modified);
        }

        match &self.plan {
            TransferPlan::Normal => {
                headers.set_content_type(&self.media_type);
            }
            TransferPlan::Single(range) => {
                headers.set_content_type(&self.media_type);
                headers.set_content_range(ContentRangeHeaderValue::for_range(*range, self.size));
            }
            TransferPlan::Multi { boundary, .. } => {
                headers.set(HeaderName::ContentType, format!("multipart/x-byteranges; boundary={boundary}"));
                headers.remove(HeaderName::ContentRange);
            }
            TransferPlan::Unsatisfiable => {
                headers.set_content_range(ContentRangeHeaderValue::Unsatisfied { complete_length: self.size });
            }
        }

        headers.set_content_length(self.content_length());
    }

    fn content_disposition(&self) -> String {
        let disposition = if self.options.inline { "inline" } else { "attachment" };
        match self.path.file_name().and_then(|name| name.to_str()) {
            Some(name) => format!("{disposition}; filename=\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\"")),
            None => disposition.to_owned(),
        }
    }

    fn part_header(&self, boundary: &str, range: ByteRange) -> String {
        format!(
            "\r\n--{boundary}\r\nContent-Type: {}\r\nContent-Range: bytes {}-{}/{}\r\n\r\n",
            self.media_type.as_str(), range.first, range.last, self.size
        )
    }

    /// Writes the body to the transport, stopping as soon as the client
    /// disconnects. Fails with [`Error::ResourceChanged`] when the file got
    /// shorter than the `Content-Length` that was announced.
    pub async fn transfer<T: Transport>(&mut self, transport: &mut T) -> Result<TransferOutcome> {
        if self.plan == TransferPlan::Unsatisfiable {
            return Ok(TransferOutcome::Completed);
        }

        let current_size = self.file.metadata().await
            .map_err(|_| Error::StatResourceUnavailable(self.path.clone()))?
            .len();
        if current_size < self.size {
            warn!("{} shrunk from {} to {current_size} bytes before it was sent", self.path.display(), self.size);
            return Err(Error::ResourceChanged(self.path.clone()));
        }

        let outcome = match self.plan.clone() {
            TransferPlan::Unsatisfiable => TransferOutcome::Completed,
            TransferPlan::Normal => {
                let whole = self.size.checked_sub(1).map(|last| ByteRange { first: 0, last });
                self.copy_range(transport, whole).await?
            }
            TransferPlan::Single(range) => self.copy_range(transport, Some(range)).await?,
            TransferPlan::Multi { ranges, boundary } => self.copy_multipart(transport, &ranges, &boundary).await?,
        };

        if outcome == TransferOutcome::ClientDisconnected {
            debug!("Client disconnected during the download of {}", self.path.display());
        }
        Ok(outcome)
    }

    async fn copy_multipart<T: Transport>(&mut self, transport: &mut T, ranges: &[ByteRange], boundary: &str) -> Result<TransferOutcome> {
        for range in ranges {
            transport.write_all(self.part_header(boundary, *range).as_bytes()).await?;
            if self.copy_range(transport, Some(*range)).await? == TransferOutcome::ClientDisconnected {
                return Ok(TransferOutcome::ClientDisconnected);
            }
        }

        transport.write_all(closing_delimiter(boundary).as_bytes()).await?;
        transport.flush().await?;
        Ok(TransferOutcome::Completed)
    }

    /// Copies the range of the file in chunks of `read_length`. An empty file
    /// has no range.
    async fn copy_range<T: Transport>(&mut self, transport: &mut T, range: Option<ByteRange>) -> Result<TransferOutcome> {
        let Some(range) = range else {
            return Ok(TransferOutcome::Completed);
        };

        self.file.seek(SeekFrom::Start(range.first)).await?;

        let mut buffer = vec![0; self.options.read_length.max(1)];
        let mut remaining = range.length();
        while remaining > 0 {
            let wanted = buffer.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
            let length = self.file.read(&mut buffer[..wanted]).await?;
            if length == 0 {
                warn!("{} ended {remaining} bytes early", self.path.display());
                return Err(Error::ResourceChanged(self.path.clone()));
            }

            transport.write_all(&buffer[..length]).await?;
            transport.flush().await?;
            remaining -= length as u64;
            trace!("Wrote {length} bytes, {remaining} remaining in range");

            if let Some(delay) = self.options.delay {
                tokio::time::sleep(delay).await;
            }

            if !transport.is_connected() {
                return Ok(TransferOutcome::ClientDisconnected);
            }
        }

        Ok(TransferOutcome::Completed)
    }
}

fn closing_delimiter(boundary: &str) -> String {
    format!("\r\n--{boundary}--\r\n")
}

/// The boundary is the same for every request of the same file.
fn boundary_for(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

fn plan_transfer(path: &Path, size: u64, accept_ranges: bool, range_header: Option<&str>) -> TransferPlan {
    let Some(range_header) = range_header.filter(|_| accept_ranges) else {
        return TransferPlan::Normal;
    };

    match evaluate_range_header(range_header, size) {
        RangeRequest::Ignored => TransferPlan::Normal,
        RangeRequest::Unsatisfiable => TransferPlan::Unsatisfiable,
        RangeRequest::Satisfiable(mut ranges) => {
            if ranges.len() == 1 {
                TransferPlan::Single(ranges.remove(0))
            } else {
                TransferPlan::Multi { ranges, boundary: boundary_for(path) }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{io::Write, time::Duration};

    use rstest::rstest;

    use crate::transport::BufferedTransport;

    fn thousand_bytes() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let contents: Vec<u8> = (0..1000u32).map(|index| b'a' + (index % 26) as u8).collect();
        file.write_all(&contents).unwrap();
        file
    }

    #[rstest]
    #[case(None, true, TransferPlan::Normal)]
    #[case(Some("bytes=0-499"), false, TransferPlan::Normal)]
    #[case(Some("items=0-5"), true, TransferPlan::Normal)]
    #[case(Some("bytes=0-499"), true, TransferPlan::Single(ByteRange { first: 0, last: 499 }))]
    #[case(Some("bytes=500-"), true, TransferPlan::Single(ByteRange { first: 500, last: 999 }))]
    #[case(Some("bytes=-100"), true, TransferPlan::Single(ByteRange { first: 900, last: 999 }))]
    #[case(Some("bytes=2000-3000"), true, TransferPlan::Unsatisfiable)]
    #[case(Some("bytes=a-b"), true, TransferPlan::Unsatisfiable)]
    fn test_plan(#[case] header: Option<&str>, #[case] accept_ranges: bool, #[case] expected: TransferPlan) {
        assert_eq!(plan_transfer(Path::new("/srv/file.bin"), 1000, accept_ranges, header), expected);
    }

    #[test]
    fn test_boundary_is_stable_per_path() {
        assert_eq!(boundary_for(Path::new("/a")), boundary_for(Path::new("/a")));
        assert_ne!(boundary_for(Path::new("/a")), boundary_for(Path::new("/b")));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let result = RangeDownload::open("/nonexistent/file.bin", DownloadOptions::default(), None).await;
        assert!(matches!(result, Err(Error::InvalidFilePath(_))));
    }

    #[tokio::test]
    async fn test_single_range_transfer() {
        let file = thousand_bytes();
        let mut download = RangeDownload::open(file.path(), DownloadOptions::default(), Some("bytes=26-51")).await.unwrap();

        let mut headers = HeaderMap::new();
        download.apply_headers(&mut headers);
        assert_eq!(download.status_code(), 206);
        assert_eq!(headers.get(HeaderName::ContentRange), Some("bytes 26-51/1000"));
        assert_eq!(headers.get(HeaderName::ContentLength), Some("26"));
        assert_eq!(headers.get(HeaderName::AcceptRanges), Some("bytes"));

        let mut transport = BufferedTransport::new();
        let outcome = download.transfer(&mut transport).await.unwrap();
        assert_eq!(outcome, TransferOutcome::Completed);
        assert_eq!(transport.body(), b"abcdefghijklmnopqrstuvwxyz");
    }

    #[tokio::test]
    async fn test_multi_range_transfer() {
        let file = thousand_bytes();
        let mut download = RangeDownload::open(file.path(), DownloadOptions::default(), Some("bytes=0-1,26-27")).await.unwrap();
        let TransferPlan::Multi { boundary, .. } = download.plan().clone() else {
            panic!("expected a multipart plan");
        };

        let mut transport = BufferedTransport::new();
        download.transfer(&mut transport).await.unwrap();

        let expected = format!(
            "\r\n--{boundary}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Range: bytes 0-1/1000\r\n\r\nab\
             \r\n--{boundary}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Range: bytes 26-27/1000\r\n\r\nab\
             \r\n--{boundary}--\r\n"
        );
        assert_eq!(transport.body(), expected.as_bytes());
        assert_eq!(download.content_length(), expected.len() as u64);
    }

    #[tokio::test]
    async fn test_unsatisfiable_headers() {
        let file = thousand_bytes();
        let download = RangeDownload::open(file.path(), DownloadOptions::default(), Some("bytes=2000-3000")).await.unwrap();

        let mut headers = HeaderMap::new();
        download.apply_headers(&mut headers);
        assert_eq!(download.status_code(), 416);
        assert_eq!(headers.get(HeaderName::ContentRange), Some("*/1000"));
        assert_eq!(headers.get(HeaderName::ContentLength), Some("0"));
    }

    #[tokio::test]
    async fn test_disconnect_stops_transfer() {
        let file = thousand_bytes();
        let options = DownloadOptions { read_length: 100, ..Default::default() };
        let mut download = RangeDownload::open(file.path(), options, None).await.unwrap();

        let mut transport = BufferedTransport::new().with_disconnect_after(250);
        let outcome = download.transfer(&mut transport).await.unwrap();
        assert_eq!(outcome, TransferOutcome::ClientDisconnected);
        assert_eq!(transport.body().len(), 300);
    }

    #[tokio::test]
    async fn test_disconnect_during_multipart_skips_closing_delimiter() {
        let file = thousand_bytes();
        let options = DownloadOptions { read_length: 100, ..Default::default() };
        let mut download = RangeDownload::open(file.path(), options, Some("bytes=0-499,500-999")).await.unwrap();
        let TransferPlan::Multi { boundary, .. } = download.plan().clone() else {
            panic!("expected a multipart plan");
        };

        let mut transport = BufferedTransport::new().with_disconnect_after(300);
        let outcome = download.transfer(&mut transport).await.unwrap();
        assert_eq!(outcome, TransferOutcome::ClientDisconnected);

        let body = String::from_utf8_lossy(transport.body()).into_owned();
        assert!(body.starts_with(&format!("\r\n--{boundary}\r\n")));
        assert!(!body.contains("Content-Range: bytes 500-999/1000"));
        assert!(!body.contains(&format!("--{boundary}--")));
        assert!((transport.body().len() as u64) < download.content_length());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_chunks() {
        let file = thousand_bytes();
        let options = DownloadOptions {
            read_length: 100,
            delay: Some(Duration::from_secs(1)),
            ..Default::default()
        };
        let mut download = RangeDownload::open(file.path(), options, None).await.unwrap();

        let start = tokio::time::Instant::now();
        let mut transport = BufferedTransport::new();
        let outcome = download.transfer(&mut transport).await.unwrap();

        assert_eq!(outcome, TransferOutcome::Completed);
        assert_eq!(transport.body().len(), 1000);
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_file_shrunk_before_transfer() {
        let file = thousand_bytes();
        let mut download = RangeDownload::open(file.path(), DownloadOptions::default(), None).await.unwrap();
        file.as_file().set_len(500).unwrap();

        let mut transport = BufferedTransport::new();
        let result = download.transfer(&mut transport).await;
        assert!(matches!(result, Err(Error::ResourceChanged(_))));
        assert!(transport.body().is_empty());
    }

    #[tokio::test]
    async fn test_pre_epoch_modification_time_is_not_sent() {
        let file = thousand_bytes();
        file.as_file().set_modified(std::time::UNIX_EPOCH - Duration::from_secs(86400)).unwrap();

        let download = RangeDownload::open(file.path(), DownloadOptions::default(), None).await.unwrap();
        let mut headers = HeaderMap::new();
        download.apply_headers(&mut headers);
        assert!(!headers.contains(HeaderName::LastModified));
        assert_eq!(headers.get(HeaderName::ContentLength), Some("1000"));
    }

    #[tokio::test]
    async fn test_content_disposition() {
        let file = thousand_bytes();
        let name = file.path().file_name().unwrap().to_str().unwrap().to_owned();

        let options = DownloadOptions { inline: true, accept_ranges: false, ..Default::default() };
        let download = RangeDownload::open(file.path(), options, Some("bytes=0-1")).await.unwrap();

        let mut headers = HeaderMap::new();
        download.apply_headers(&mut headers);
        assert_eq!(headers.get(HeaderName::ContentDisposition), Some(format!("inline; filename=\"{name}\"").as_str()));
        assert_eq!(headers.get(HeaderName::AcceptRanges), Some("none"));
        assert_eq!(headers.get(HeaderName::ContentLength), Some("1000"));
        assert!(headers.contains(HeaderName::LastModified));
    }
}
