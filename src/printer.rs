use anyhow::Context;
use chrono::NaiveDate;
use futures::stream::TryStreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::keys::{self, PrefixGroup};
use crate::selection::Selection;
use crate::store::LogSource;

/// Prints every log object matched by `selection` to `out`, groups in order.
///
/// Each group is searched independently: a day without logs is skipped and
/// does not affect the others. Store failures are returned as is, nothing is
/// retried. Returns the number of objects printed.
pub async fn print_logs<S, W>(
    source: &S,
    selection: &Selection,
    today: NaiveDate,
    out: &mut W,
) -> Result<usize, anyhow::Error>
where
    S: LogSource + ?Sized,
    W: AsyncWrite + Unpin,
{
    let mut printed = 0;
    for group in keys::resolve(selection, today) {
        printed += print_group(source, &group, out).await?;
    }
    out.flush().await.context("flushing output")?;

    Ok(printed)
}

/// Prints the objects under the first prefix of `group` that has any.
pub async fn print_group<S, W>(
    source: &S,
    group: &PrefixGroup,
    out: &mut W,
) -> Result<usize, anyhow::Error>
where
    S: LogSource + ?Sized,
    W: AsyncWrite + Unpin,
{
    let keys = match first_listing(source, group).await? {
        Some(keys) => keys,
        None => {
            log::debug!("no logs under {:?}", group);
            return Ok(0);
        }
    };

    for key in &keys {
        log::debug!("fetching {}", key);
        let mut body = source
            .fetch(key)
            .await
            .with_context(|| format!("fetching {}", key))?;

        while let Some(chunk) = body
            .try_next()
            .await
            .with_context(|| format!("reading {}", key))?
        {
            out.write_all(&chunk).await.context("writing output")?;
        }
    }

    Ok(keys.len())
}

async fn first_listing<S>(source: &S, group: &PrefixGroup) -> Result<Option<Vec<String>>, anyhow::Error>
where
    S: LogSource + ?Sized,
{
    for prefix in group {
        log::debug!("listing {}", prefix);
        let keys = source
            .list_keys(prefix)
            .await
            .with_context(|| format!("listing {}", prefix))?;
        if !keys.is_empty() {
            return Ok(Some(keys));
        }
    }

    Ok(None)
}
