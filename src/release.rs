// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Fetching and selection of recent release tags.
///
/// Pages are accumulated until the endpoint runs dry or the requested limit
/// is covered, then ordered by publication time so that "recent" always means
/// most recently published rather than API order.
use chrono::{DateTime, FixedOffset};
use tracing::info;

use crate::{
    config::StreamConfig,
    error::Error,
    source::{ReleaseRecord, ReleaseSource},
};

/// Fetches tag names of `repository`, most recently published first.
///
/// Pages are requested sequentially starting at 1 and stop at the first empty
/// page or once at least `limit` records were accumulated. When `limit` is
/// set the sorted list is truncated to exactly that many entries.
///
/// # Errors
///
/// Returns [`Error::Transport`] as soon as any page request fails and
/// [`Error::Timestamp`] when a publication time cannot be parsed.
///
/// # Example
///
/// ```no_run
/// use toolchain_matrix::{GithubReleases, GithubToken, ProcessEnvironment, fetch_release_tags};
///
/// # async fn example() -> Result<(), toolchain_matrix::Error> {
/// let token = GithubToken::from_environment(&ProcessEnvironment,)?;
/// let source = GithubReleases::new(&token,)?;
/// let tags = fetch_release_tags(&source, "leanprover/lean4", Some(30,),).await?;
/// println!("{tags:?}");
/// # Ok(())
/// # }
/// ```
pub async fn fetch_release_tags<S,>(
    source: &S,
    repository: &str,
    limit: Option<usize,>,
) -> Result<Vec<String,>, Error,>
where
    S: ReleaseSource,
{
    let mut releases = Vec::new();

    for page in 1u32.. {
        let batch = source.list_releases(repository, page,).await?;
        info!("Got {} releases from {}", batch.len(), repository);

        let exhausted = batch.is_empty();
        releases.extend(batch,);

        if exhausted || limit.is_some_and(|limit| releases.len() >= limit,) {
            break;
        }
    }

    let recent = most_recent(releases, limit,)?;
    Ok(recent.into_iter().map(|release| release.tag_name,).collect(),)
}

/// Orders records by publication time, newest first, and keeps at most
/// `limit` of them.
///
/// The sort is stable: records published at the same instant keep their
/// relative input order.
///
/// # Errors
///
/// Returns [`Error::Timestamp`] for the first record whose `published_at` is
/// not a valid RFC 3339 timestamp.
pub fn most_recent(
    releases: Vec<ReleaseRecord,>,
    limit: Option<usize,>,
) -> Result<Vec<ReleaseRecord,>, Error,>
{
    let mut dated = releases
        .into_iter()
        .map(|release| Ok::<_, Error,>((published_at(&release,)?, release,),),)
        .collect::<Result<Vec<_,>, Error,>>()?;

    dated.sort_by(|(left, _,), (right, _,)| right.cmp(left,),);

    if let Some(limit,) = limit {
        dated.truncate(limit,);
    }

    Ok(dated.into_iter().map(|(_, release,)| release,).collect(),)
}

/// Parses the publication timestamp of a release.
///
/// # Errors
///
/// Returns [`Error::Timestamp`] when the value is not RFC 3339.
pub fn published_at(release: &ReleaseRecord,) -> Result<DateTime<FixedOffset,>, Error,>
{
    DateTime::parse_from_rfc3339(release.published_at.trim(),).map_err(|_| Error::Timestamp {
        tag:   release.tag_name.clone(),
        value: release.published_at.clone(),
    },)
}

/// Keeps only tags starting with `prefix`, preserving order.
///
/// # Examples
///
/// ```
/// use toolchain_matrix::filter_by_prefix;
///
/// let tags = vec!["nightly-2024-01-01".to_owned(), "untagged-build".to_owned()];
/// assert_eq!(filter_by_prefix(tags, "nightly",), vec!["nightly-2024-01-01".to_owned()]);
/// ```
pub fn filter_by_prefix(tags: Vec<String,>, prefix: &str,) -> Vec<String,>
{
    tags.into_iter().filter(|tag| tag.starts_with(prefix,),).collect()
}

/// Fetches the retention window of a stream and applies its prefix filter.
///
/// Filtering runs after truncation, so fewer than `stream.keep` tags may be
/// returned when the window contains non-matching releases. An empty result
/// is not an error.
///
/// # Errors
///
/// Propagates errors from [`fetch_release_tags`].
pub async fn select_stream<S,>(source: &S, stream: &StreamConfig,) -> Result<Vec<String,>, Error,>
where
    S: ReleaseSource,
{
    let tags = fetch_release_tags(source, &stream.repository, Some(stream.keep,),).await?;
    Ok(tags.into_iter().filter(|tag| stream.matches(tag,),).collect(),)
}

#[cfg(test)]
mod tests
{
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::source::testing::{CannedReleases, record};

    const STABLE: &str = "leanprover/lean4";

    fn timestamp(seconds: i64,) -> String
    {
        DateTime::<Utc,>::from_timestamp(seconds, 0,).expect("timestamp in range",).to_rfc3339()
    }

    /// Builds `count` stable releases published one day apart, oldest first.
    fn stable_releases(count: usize,) -> Vec<ReleaseRecord,>
    {
        (0..count)
            .map(|index| {
                let published = timestamp(1_700_000_000 + index as i64 * 86_400,);
                record(&format!("v4.{index}.0"), &published,)
            },)
            .collect()
    }

    proptest! {
        #[test]
        fn most_recent_is_ordered_and_bounded(
            seconds in prop::collection::vec(0i64..4_000_000_000, 0..60),
            limit in prop::option::of(0usize..40),
        ) {
            let releases: Vec<ReleaseRecord> = seconds
                .iter()
                .enumerate()
                .map(|(index, value)| record(&format!("tag-{index}"), &timestamp(*value)))
                .collect();

            let recent = most_recent(releases.clone(), limit).expect("valid timestamps");

            let expected_len = limit.map_or(releases.len(), |limit| limit.min(releases.len()));
            prop_assert_eq!(recent.len(), expected_len);

            for pair in recent.windows(2) {
                let newer = published_at(&pair[0]).expect("valid");
                let older = published_at(&pair[1]).expect("valid");
                prop_assert!(newer >= older);
            }

            if let Some(oldest_kept) = recent.last() {
                let cutoff = published_at(oldest_kept).expect("valid");
                let newer_dropped = releases
                    .iter()
                    .filter(|release| !recent.contains(release))
                    .any(|release| published_at(release).expect("valid") > cutoff);
                prop_assert!(!newer_dropped);
            }
        }

        #[test]
        fn prefix_filter_is_idempotent(tags in prop::collection::vec("(v|nightly-|x)[0-9a-z.]{0,6}", 0..30)) {
            let once = filter_by_prefix(tags.clone(), "v");
            let twice = filter_by_prefix(once.clone(), "v");
            prop_assert_eq!(&once, &twice);

            let expected: Vec<String> = tags.into_iter().filter(|tag| tag.starts_with('v')).collect();
            prop_assert_eq!(once, expected);
        }
    }

    #[test]
    fn equal_timestamps_keep_input_order()
    {
        let releases = vec![
            record("b", "2024-01-01T00:00:00Z",),
            record("a", "2024-01-01T00:00:00Z",),
            record("c", "2024-02-01T00:00:00Z",),
        ];
        let recent = most_recent(releases, None,).expect("valid timestamps",);
        let tags: Vec<&str,> = recent.iter().map(|release| release.tag_name.as_str(),).collect();
        assert_eq!(tags, vec!["c", "b", "a"]);
    }

    #[test]
    fn offsets_are_compared_as_instants()
    {
        let releases = vec![
            record("earlier", "2024-01-01T10:00:00+02:00",),
            record("later", "2024-01-01T09:00:00Z",),
        ];
        let recent = most_recent(releases, None,).expect("valid timestamps",);
        assert_eq!(recent[0].tag_name, "later");
    }

    #[test]
    fn malformed_timestamp_is_reported()
    {
        let releases = vec![record("v4.9.0", "yesterday",)];
        let error = most_recent(releases, None,).expect_err("expected timestamp error",);
        match error {
            Error::Timestamp {
                tag,
                value,
            } => {
                assert_eq!(tag, "v4.9.0");
                assert_eq!(value, "yesterday");
            }
            other => panic!("unexpected error variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn keeps_thirty_most_recent_of_two_pages()
    {
        let mut releases = stable_releases(35,);
        // API order differs from publication order.
        releases.reverse();
        releases.swap(0, 30,);
        let second_page = releases.split_off(25,);
        let source = CannedReleases::default().with_pages(STABLE, vec![releases, second_page],);

        let stream = StreamConfig::stable();
        let selected = select_stream(&source, &stream,).await.expect("selection succeeds",);

        assert_eq!(selected.len(), 30);
        assert_eq!(selected.first().map(String::as_str), Some("v4.34.0"));
        assert_eq!(selected.last().map(String::as_str), Some("v4.5.0"));
        assert_eq!(source.requests(), vec![(STABLE.to_owned(), 1,), (STABLE.to_owned(), 2,)]);
    }

    #[tokio::test]
    async fn stops_paging_once_limit_is_reached()
    {
        let releases = stable_releases(10,);
        let pages = releases.chunks(4,).map(<[ReleaseRecord]>::to_vec,).collect();
        let source = CannedReleases::default().with_pages(STABLE, pages,);

        let tags = fetch_release_tags(&source, STABLE, Some(5,),).await.expect("fetch succeeds",);

        assert_eq!(tags, vec!["v4.7.0", "v4.6.0", "v4.5.0", "v4.4.0", "v4.3.0"]);
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn unlimited_fetch_reads_until_empty_page()
    {
        let releases = stable_releases(7,);
        let pages = releases.chunks(3,).map(<[ReleaseRecord]>::to_vec,).collect();
        let source = CannedReleases::default().with_pages(STABLE, pages,);

        let tags = fetch_release_tags(&source, STABLE, None,).await.expect("fetch succeeds",);

        assert_eq!(tags.len(), 7);
        assert_eq!(source.requests().len(), 4);
    }

    #[tokio::test]
    async fn empty_first_page_yields_empty_list()
    {
        let source = CannedReleases::default();
        let tags = fetch_release_tags(&source, STABLE, Some(30,),).await.expect("fetch succeeds",);
        assert!(tags.is_empty());
        assert_eq!(source.requests(), vec![(STABLE.to_owned(), 1,)]);
    }

    #[tokio::test]
    async fn failing_page_aborts_fetch()
    {
        let source = CannedReleases::default()
            .with_pages(STABLE, vec![stable_releases(3,), stable_releases(3,)],)
            .failing_at(STABLE, 2,);

        let error = fetch_release_tags(&source, STABLE, None,).await.expect_err("expected failure",);
        assert!(matches!(error, Error::Transport { .. }));
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn custom_stream_prefix_applies_after_truncation()
    {
        let stream = StreamConfig {
            repository: STABLE.to_owned(),
            prefix:     "v4.1".to_owned(),
            keep:       3,
        };
        let source = CannedReleases::default().with_pages(STABLE, vec![stable_releases(20,)],);

        let selected = select_stream(&source, &stream,).await.expect("selection succeeds",);
        assert_eq!(selected, vec!["v4.19.0", "v4.18.0", "v4.17.0"]);

        let narrow = StreamConfig {
            keep: 4,
            prefix: "v4.19".to_owned(),
            ..stream
        };
        let selected = select_stream(&source, &narrow,).await.expect("selection succeeds",);
        assert_eq!(selected, vec!["v4.19.0"]);
    }

    #[tokio::test]
    async fn nightly_filter_drops_foreign_tags()
    {
        let nightly = StreamConfig::nightly();
        let source = CannedReleases::default().with_pages(&nightly.repository, vec![vec![
            record("untagged-build", "2024-01-02T00:00:00Z",),
            record("nightly-2024-01-01", "2024-01-01T00:00:00Z",),
        ]],);

        let selected = select_stream(&source, &nightly,).await.expect("selection succeeds",);
        assert_eq!(selected, vec!["nightly-2024-01-01".to_owned()]);
    }
}
