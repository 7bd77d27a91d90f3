use std::io::SeekFrom;

use tokio::io::{self, AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Reads the last line of a file by scanning backwards from the end, so
/// recovery never has to replay a whole day of records. A trailing newline
/// does not count as an extra line; an empty file yields `None`.
pub async fn read_last_line(
    file: &mut (impl AsyncRead + AsyncSeek + Unpin),
    buffer: &mut [u8],
) -> Result<Option<String>, io::Error> {
    let mut end = file.seek(SeekFrom::End(0)).await?;

    // Walk over line terminators at the end of the file, so that reading
    // doesn't get stuck on the final newline of a complete record.
    while end > 0 {
        let chunk = u64::min(end, buffer.len() as u64) as usize;
        file.seek(SeekFrom::Start(end - chunk as u64)).await?;
        file.read_exact(&mut buffer[..chunk]).await?;
        let terminators = buffer[..chunk]
            .iter()
            .rev()
            .take_while(|b| **b == b'\n' || **b == b'\r')
            .count();
        end -= terminators as u64;
        if terminators < chunk {
            break;
        }
    }

    if end == 0 {
        return Ok(None);
    }

    // Scan backwards from the line end for the newline preceding it.
    let mut start = end;
    'scan: while start > 0 {
        let chunk = u64::min(start, buffer.len() as u64) as usize;
        file.seek(SeekFrom::Start(start - chunk as u64)).await?;
        file.read_exact(&mut buffer[..chunk]).await?;
        for (index, value) in buffer[..chunk].iter().rev().enumerate() {
            if *value == b'\n' {
                start -= index as u64;
                break 'scan;
            }
        }
        start -= chunk as u64;
    }

    file.seek(SeekFrom::Start(start)).await?;
    let mut line = vec![0; (end - start) as usize];
    file.read_exact(&mut line).await?;
    Ok(Some(String::from_utf8_lossy(&line).into_owned()))
}
