use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const JOB_VIEW_URL: &str = "https://www.linkedin.com/jobs/view/";

/// Canonical detail-page link for a job id.
pub fn job_link(job_id: &str) -> String {
    format!("{JOB_VIEW_URL}{job_id}/")
}

/// Job ids are non-empty runs of ASCII digits.
pub fn is_job_id(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit())
}

/// Pulls the job id out of a `/jobs/view/...` href.
///
/// Handles both `/jobs/view/3156228491/` and the slugged form
/// `/jobs/view/data-scientist-at-acme-3156228491/?refId=...`.
pub fn job_id_from_href(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("/jobs/view/")?;
    let segment = rest.split(['/', '?', '#']).next()?;
    let id = segment.rsplit('-').next()?;
    is_job_id(id).then(|| id.to_owned())
}

/// Rows keyed by job id.
pub trait Keyed {
    fn job_id(&self) -> &str;
}

/// Concatenates `fresh` before `prior`, keeping the first row seen for each job id.
pub fn merge_new_first<T: Keyed>(fresh: Vec<T>, prior: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::new();
    fresh
        .into_iter()
        .chain(prior)
        .filter(|row| seen.insert(row.job_id().to_owned()))
        .collect()
}

pub fn known_ids<T: Keyed>(rows: &[T]) -> HashSet<String> {
    rows.iter().map(|row| row.job_id().to_owned()).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLinkRecord {
    #[serde(rename = "DateTimeReadUTC", with = "timestamp")]
    pub read_at: DateTime<Utc>,
    pub job_id: String,
    pub job_link: String,
}

impl JobLinkRecord {
    pub fn new(job_id: String, read_at: DateTime<Utc>) -> Self {
        let job_link = job_link(&job_id);
        Self {
            read_at,
            job_id,
            job_link,
        }
    }
}

impl Keyed for JobLinkRecord {
    fn job_id(&self) -> &str {
        &self.job_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDetailRecord {
    #[serde(rename = "Date")]
    pub posted_date: String,
    pub job_id: String,
    #[serde(rename = "Company")]
    pub company: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "WorkMethods")]
    pub work_method: String,
    #[serde(rename = "WorkTimes")]
    pub work_time: String,
    #[serde(rename = "Link")]
    pub link: String,
    #[serde(rename = "ReadDateTimeUTC", with = "timestamp")]
    pub read_at: DateTime<Utc>,
}

impl Keyed for JobDetailRecord {
    fn job_id(&self) -> &str {
        &self.job_id
    }
}

/// Descriptions are stored on one line.
pub fn normalize_description(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}

/// `YYYY-MM-DD HH:MM:SS.ffffff` in UTC, the layout the tables have always used.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
    const READ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

    pub fn format(at: &DateTime<Utc>) -> String {
        at.format(WRITE_FORMAT).to_string()
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
        let raw = raw.trim();
        NaiveDateTime::parse_from_str(raw, READ_FORMAT)
            .map(|naive| naive.and_utc())
            .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|at| at.with_timezone(&Utc)))
    }

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(at))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }
}
