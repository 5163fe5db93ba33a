//! Upload path derivation
//!
//! Every uploaded asset is stored at a relative path built from its owning
//! issue, the current instant and a sanitized copy of the client filename:
//!
//! - issue cover: `issue_covers/<pub year>/<issue slug>/<ts>_<name>`
//! - image photo: `images/<issue slug>/<ts>_<name>`
//! - article related image: `article_images/<issue slug>/<ts>_<name>`
//!
//! `<ts>` is the number of microseconds since 2014-01-01T00:00:00Z, so two
//! uploads of the same file only collide when they land on the same
//! microsecond. Derivation never fails.

use chrono::{DateTime, Datelike, Utc};
use std::fmt;
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use crate::models::Issue;

/// 2014-01-01T00:00:00Z as microseconds since the Unix epoch
const TIMESTAMP_EPOCH_MICROS: i64 = 1_388_534_400_000_000;

/// Which kind of asset an upload is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UploadKind {
    IssueCover,
    Image,
    ArticleImage,
}

impl UploadKind {
    /// Top-level directory under the media root
    pub fn directory(&self) -> &'static str {
        match self {
            UploadKind::IssueCover => "issue_covers",
            UploadKind::Image => "images",
            UploadKind::ArticleImage => "article_images",
        }
    }
}

impl fmt::Display for UploadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.directory())
    }
}

/// Keep only alphanumeric characters and dots, in order, case preserved.
///
/// The result may be empty.
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '.')
        .collect()
}

/// Microseconds between 2014-01-01T00:00:00Z and `instant`, as decimal text.
///
/// Instants before 2014 give a negative number.
pub fn upload_timestamp(instant: DateTime<Utc>) -> String {
    (instant.timestamp_micros() - TIMESTAMP_EPOCH_MICROS).to_string()
}

/// Derives storage paths for uploads, reading the time from an injected clock
#[derive(Clone)]
pub struct UploadPathDeriver {
    clock: Arc<dyn Clock>,
}

impl UploadPathDeriver {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Deriver reading the system clock
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }

    /// Path of an issue's cover image
    pub fn issue_cover_path(&self, issue: &Issue, filename: &str) -> String {
        self.derive(UploadKind::IssueCover, issue, filename)
    }

    /// Path of the photo of image content published in `issue`
    pub fn image_path(&self, issue: &Issue, filename: &str) -> String {
        self.derive(UploadKind::Image, issue, filename)
    }

    /// Path of the related image of an article published in `issue`
    pub fn article_image_path(&self, issue: &Issue, filename: &str) -> String {
        self.derive(UploadKind::ArticleImage, issue, filename)
    }

    pub fn derive(&self, kind: UploadKind, issue: &Issue, filename: &str) -> String {
        let file = format!(
            "{}_{}",
            upload_timestamp(self.clock.now()),
            sanitize_filename(filename)
        );
        let issue_slug = slug::slugify(&issue.name);

        match kind {
            UploadKind::IssueCover => format!(
                "{}/{}/{}/{}",
                kind.directory(),
                issue.pub_date.year(),
                issue_slug,
                file
            ),
            UploadKind::Image | UploadKind::ArticleImage => {
                format!("{}/{}/{}", kind.directory(), issue_slug, file)
            }
        }
    }
}

impl Default for UploadPathDeriver {
    fn default() -> Self {
        Self::system()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::FixedClock;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn spring_issue() -> Issue {
        Issue::new(
            "Spring Issue".to_string(),
            NaiveDate::from_ymd_opt(2015, 3, 1).unwrap(),
        )
    }

    fn deriver_at(instant: DateTime<Utc>) -> (UploadPathDeriver, FixedClock) {
        let clock = FixedClock::new(instant);
        (UploadPathDeriver::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_sanitize_keeps_alphanumerics_and_dots() {
        assert_eq!(sanitize_filename("My Photo #1 (final).JPG"), "MyPhoto1final.JPG");
        assert_eq!(sanitize_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_filename("été.png"), "été.png");
        assert_eq!(sanitize_filename("!!!"), "");
    }

    #[test]
    fn test_timestamp_counts_from_2014() {
        let epoch = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();

        assert_eq!(upload_timestamp(epoch), "0");
        assert_eq!(upload_timestamp(epoch + Duration::seconds(1)), "1000000");
        assert_eq!(upload_timestamp(epoch - Duration::microseconds(3)), "-3");
    }

    #[test]
    fn test_issue_cover_path() {
        let at = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 1).unwrap();
        let (deriver, _clock) = deriver_at(at);

        let path = deriver.issue_cover_path(&spring_issue(), "cover art.jpg");

        assert_eq!(path, "issue_covers/2015/spring-issue/1000000_coverart.jpg");
    }

    #[test]
    fn test_image_and_article_paths() {
        let at = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 2).unwrap();
        let (deriver, _clock) = deriver_at(at);
        let issue = spring_issue();

        assert_eq!(
            deriver.image_path(&issue, "a b.png"),
            "images/spring-issue/2000000_ab.png"
        );
        assert_eq!(
            deriver.article_image_path(&issue, "a b.png"),
            "article_images/spring-issue/2000000_ab.png"
        );
    }

    #[test]
    fn test_empty_sanitized_name_still_derives() {
        let (deriver, _clock) = deriver_at(Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap());

        assert_eq!(deriver.image_path(&spring_issue(), "###"), "images/spring-issue/0_");
    }

    #[test]
    fn test_issue_name_is_slugified() {
        let (deriver, _clock) = deriver_at(Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap());
        let issue = Issue::new(
            "  Café Été: Vol. 2 ".to_string(),
            NaiveDate::from_ymd_opt(2016, 7, 1).unwrap(),
        );

        let path = deriver.image_path(&issue, "x.jpg");

        assert_eq!(path, "images/cafe-ete-vol-2/0_x.jpg");
    }

    #[test]
    fn test_distinct_instants_give_distinct_paths() {
        let (deriver, clock) = deriver_at(Utc.with_ymd_and_hms(2019, 5, 5, 5, 5, 5).unwrap());
        let issue = spring_issue();

        let first = deriver.image_path(&issue, "same.jpg");
        clock.advance(Duration::microseconds(1));
        let second = deriver.image_path(&issue, "same.jpg");

        assert_ne!(first, second);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_sanitized_chars_are_alphanumeric_or_dot(name in ".*") {
                let sanitized = sanitize_filename(&name);

                prop_assert!(sanitized.chars().all(|c| c.is_alphanumeric() || c == '.'));
                prop_assert_eq!(sanitize_filename(&sanitized), sanitized.clone());
            }

            #[test]
            fn prop_timestamp_is_monotonic(
                a in 0i64..4_000_000_000_000_000,
                b in 0i64..4_000_000_000_000_000,
            ) {
                let epoch = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
                let ta: i64 = upload_timestamp(epoch + Duration::microseconds(a)).parse().unwrap();
                let tb: i64 = upload_timestamp(epoch + Duration::microseconds(b)).parse().unwrap();

                prop_assert_eq!(ta, a);
                prop_assert_eq!(a.cmp(&b), ta.cmp(&tb));
            }

            #[test]
            fn prop_image_path_has_three_segments(
                name in "[a-zA-Z0-9 ]{1,20}",
                file in "[^/]{0,30}",
            ) {
                let instant = Utc.with_ymd_and_hms(2020, 2, 2, 2, 2, 2).unwrap();
                let (deriver, _clock) = deriver_at(instant);
                let issue = Issue::new(name, NaiveDate::from_ymd_opt(2020, 1, 1).unwrap());

                let path = deriver.image_path(&issue, &file);
                let parts: Vec<&str> = path.split('/').collect();

                prop_assert_eq!(parts.len(), 3);
                prop_assert_eq!(parts[0], "images");
            }
        }
    }
}
