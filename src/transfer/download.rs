//! Streaming download of a resolved archive into scratch storage.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::read::DecoderReader;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{info, instrument};

use crate::model::{DirectDownloadUrl, LocalFile, PayloadEncoding};
use crate::traits::TransferError;

/// Fetches archives over HTTP without holding the body in memory.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: reqwest::Client,
    scratch_dir: PathBuf,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client, scratch_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            scratch_dir: scratch_dir.into(),
        }
    }

    /// Streams `url` into a uniquely named scratch file.
    ///
    /// The file is flushed and synced before this returns. Base64 payloads are
    /// decoded into a second scratch file and the encoded copy is removed.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Download`] on connection failures, non-2xx
    /// responses, interrupted streams and write failures.
    #[instrument(skip(self, url), fields(url = %url.url))]
    pub async fn download(&self, url: &DirectDownloadUrl) -> Result<LocalFile, TransferError> {
        let response = self
            .client
            .get(url.url.clone())
            .send()
            .await
            .map_err(|e| TransferError::Download(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::Download(format!("server answered {status}")));
        }

        let (std_file, path) = tempfile::Builder::new()
            .prefix("codeshare-download-")
            .suffix(".zip")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| TransferError::Download(format!("cannot create scratch file: {e}")))?
            .into_parts();

        let mut file = tokio::fs::File::from_std(std_file);
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| TransferError::Download(format!("stream interrupted: {e}")))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TransferError::Download(format!("write failed: {e}")))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| TransferError::Download(format!("flush failed: {e}")))?;
        file.sync_all()
            .await
            .map_err(|e| TransferError::Download(format!("sync failed: {e}")))?;
        drop(file);

        info!(size_bytes = written, path = %path.display(), "Download completed");
        let local = LocalFile::new(path, written);

        match url.encoding {
            PayloadEncoding::Raw => Ok(local),
            PayloadEncoding::Base64 => self.decode_base64(local).await,
        }
    }

    async fn decode_base64(&self, encoded: LocalFile) -> Result<LocalFile, TransferError> {
        let scratch_dir = self.scratch_dir.clone();
        tokio::task::spawn_blocking(move || decode_base64_file(encoded, &scratch_dir))
            .await
            .map_err(|e| TransferError::Other(format!("Task join error: {e}")))?
    }
}

fn decode_base64_file(
    encoded: LocalFile,
    scratch_dir: &std::path::Path,
) -> Result<LocalFile, TransferError> {
    let decode_err = |e: io::Error| TransferError::Download(format!("cannot decode payload: {e}"));

    let (out, path) = tempfile::Builder::new()
        .prefix("codeshare-download-")
        .suffix(".zip")
        .tempfile_in(scratch_dir)
        .map_err(decode_err)?
        .into_parts();

    let input = SkipWhitespace(BufReader::new(File::open(encoded.path()).map_err(decode_err)?));
    let mut decoder = DecoderReader::new(input, &STANDARD);
    let mut out = BufWriter::new(out);
    let size = io::copy(&mut decoder, &mut out).map_err(decode_err)?;
    out.flush().map_err(decode_err)?;
    out.get_ref().sync_all().map_err(decode_err)?;

    Ok(LocalFile::new(path, size))
}

/// Drops ASCII whitespace so line-wrapped base64 decodes cleanly.
struct SkipWhitespace<R>(R);

impl<R: Read> Read for SkipWhitespace<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let n = self.0.read(buf)?;
            if n == 0 {
                return Ok(0);
            }
            let mut kept = 0;
            for i in 0..n {
                if !buf[i].is_ascii_whitespace() {
                    buf[kept] = buf[i];
                    kept += 1;
                }
            }
            if kept > 0 {
                return Ok(kept);
            }
        }
    }
}
