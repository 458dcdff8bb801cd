use chrono::{TimeZone, Utc};
use linkedin_jobs::records::{known_ids, merge_new_first};
use linkedin_jobs::{JobDetailRecord, JobLinkRecord, TableStore};

fn detail(job_id: &str, company: &str, description: &str) -> JobDetailRecord {
    JobDetailRecord {
        posted_date: "1 week ago".to_string(),
        job_id: job_id.to_string(),
        company: company.to_string(),
        title: "Data Scientist".to_string(),
        location: "Vilnius, Lithuania".to_string(),
        description: description.to_string(),
        work_method: "Remote".to_string(),
        work_time: "Full-time; Mid-Senior level".to_string(),
        link: format!("https://www.linkedin.com/jobs/view/{job_id}/"),
        read_at: Utc.with_ymd_and_hms(2022, 8, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn job_ids_survive_a_round_trip_as_text() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::new(dir.path());
    let rows = vec![
        detail("0123", "Acme", "Uses \"quotes\"; and semicolons"),
        detail("00042", "", ""),
        detail("3156228491", "Beta, Inc.", "plain"),
    ];

    store.save_details(&rows).unwrap();
    let loaded = store.load_details().unwrap();

    assert_eq!(loaded, rows);
    let ids: Vec<&str> = loaded.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, ["0123", "00042", "3156228491"]);
}

#[test]
fn detail_table_uses_semicolons() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::new(dir.path());
    store.save_details(&[detail("7", "Acme", "x")]).unwrap();

    let text = std::fs::read_to_string(store.jobs_path()).unwrap();
    let row = text.lines().nth(1).unwrap();
    assert!(row.starts_with("1 week ago;7;Acme;Data Scientist;"));
    assert!(row.contains("\"Full-time; Mid-Senior level\""));
}

#[test]
fn link_table_round_trip_keeps_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::new(dir.path());
    let at = Utc.with_ymd_and_hms(2022, 8, 1, 12, 0, 0).unwrap();
    let rows: Vec<JobLinkRecord> = ["333", "0444", "111"]
        .iter()
        .map(|id| JobLinkRecord::new(id.to_string(), at))
        .collect();

    store.save_links(&rows).unwrap();
    assert_eq!(store.load_links().unwrap(), rows);
}

#[test]
fn merged_tables_never_repeat_a_job_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = TableStore::new(dir.path());
    store
        .save_details(&[detail("1", "Old", ""), detail("2", "Old", "")])
        .unwrap();

    let prior = store.load_details().unwrap();
    let known = known_ids(&prior);
    let fresh: Vec<_> = [detail("2", "New", ""), detail("3", "New", "")]
        .into_iter()
        .filter(|r| !known.contains(&r.job_id))
        .collect();
    let merged = merge_new_first(fresh, prior);
    store.save_details(&merged).unwrap();

    let loaded = store.load_details().unwrap();
    let ids: Vec<&str> = loaded.iter().map(|r| r.job_id.as_str()).collect();
    assert_eq!(ids, ["3", "1", "2"]);
    assert_eq!(loaded[2].company, "Old");
}
