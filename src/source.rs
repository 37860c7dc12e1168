use anyhow::{Context, Result};
use futures::Stream;
use futures::stream;
use std::io;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

pub type MessageReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Opens the newline-delimited JSON input: the given file, or stdin when none is set.
pub async fn open_input(path: Option<&Path>) -> Result<MessageReader> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open input file {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// One message per non-blank line, in input order.
///
/// Lines are decoded lossily: invalid UTF-8 becomes U+FFFD and the line is
/// handed on as a message, where it fails JSON parsing like any other bad
/// record instead of ending the stream.
pub fn message_stream<R>(reader: R) -> impl Stream<Item = io::Result<String>>
where
    R: AsyncBufRead + Unpin,
{
    stream::try_unfold(reader, |mut reader| async move {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => return Ok(None),
                Ok(_) => {}
                Err(e) => return Err(e),
            }

            let line = String::from_utf8_lossy(&buf);
            let line = line.trim_end_matches(['\n', '\r']);
            if line.trim().is_empty() {
                continue;
            }
            let line = line.to_string();
            return Ok(Some((line, reader)));
        }
    })
}
