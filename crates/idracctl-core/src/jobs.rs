//! Lifecycle Controller job queue
//!
//! Listing reads the manager's job collection; clearing goes through the OEM
//! `DellJobService.DeleteJobQueue` action, one request per job id.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::error::{CoreError, Result};
use crate::transport::{RestResponse, Transport};

/// Job id that makes `DeleteJobQueue` drop every job
pub const CLEAR_ALL_JOBS: &str = "JID_CLEARALL";

/// Which jobs to delete
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum JobSelection {
    /// The whole queue
    #[default]
    All,
    /// Exactly these ids, in order
    Ids(Vec<String>),
}

impl JobSelection {
    /// Ids to send, one request each
    pub fn job_ids(&self) -> Vec<String> {
        match self {
            JobSelection::All => vec![CLEAR_ALL_JOBS.to_string()],
            JobSelection::Ids(ids) => ids.clone(),
        }
    }
}

impl From<Vec<String>> for JobSelection {
    /// An empty list means every job
    fn from(ids: Vec<String>) -> Self {
        if ids.is_empty() {
            JobSelection::All
        } else {
            JobSelection::Ids(ids)
        }
    }
}

/// `JobState` values reported by the Lifecycle Controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    New,
    Scheduled,
    Running,
    Completed,
    CompletedWithErrors,
    Failed,
    Downloading,
    Downloaded,
    Waiting,
    Paused,
    #[serde(other)]
    Unknown,
}

impl JobState {
    /// Jobs that still hold the queue
    pub fn is_unfinished(&self) -> bool {
        matches!(self, JobState::Scheduled | JobState::Running)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One entry of the job collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "JobState", default = "unknown_state")]
    pub state: JobState,
    #[serde(rename = "Name", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "Message", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "PercentComplete", default, skip_serializing_if = "Option::is_none")]
    pub percent_complete: Option<u64>,
}

fn unknown_state() -> JobState {
    JobState::Unknown
}

/// Job queue operations against one manager
pub struct JobQueue<'a, T: Transport + ?Sized> {
    transport: &'a T,
    delete_job_queue_uri: &'a str,
    jobs_uri: &'a str,
}

impl<'a, T: Transport + ?Sized> JobQueue<'a, T> {
    pub fn new(transport: &'a T, delete_job_queue_uri: &'a str, jobs_uri: &'a str) -> Self {
        Self {
            transport,
            delete_job_queue_uri,
            jobs_uri,
        }
    }

    /// Delete the selected jobs.
    ///
    /// Requests go out in selection order and stop at the first failure.
    pub async fn clear(&self, selection: &JobSelection) -> Result<Vec<RestResponse>> {
        let mut responses = Vec::new();
        for job_id in selection.job_ids() {
            let response = self
                .transport
                .post(self.delete_job_queue_uri, &json!({ "JobID": job_id }))
                .await
                .map_err(|e| {
                    error!(job_id = %job_id, error = %e, "Clearing job queue failed");
                    CoreError::remote(format!("clear job queue ({})", job_id), e)
                })?;
            info!(job_id = %job_id, "Job queue entry cleared");
            responses.push(response);
        }
        Ok(responses)
    }

    /// Every job in the collection
    pub async fn list(&self) -> Result<Vec<JobRecord>> {
        let uri = format!("{}?$expand=*($levels=1)", self.jobs_uri);
        let collection = self
            .transport
            .get(&uri)
            .await
            .map_err(|e| CoreError::remote("list jobs", e))?
            .body
            .unwrap_or(Value::Null);

        let members = collection
            .get("Members")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut jobs = Vec::with_capacity(members.len());
        for member in members {
            // Controllers that ignore $expand only return links
            let member = if member.get("Id").is_none() {
                match member.get("@odata.id").and_then(Value::as_str) {
                    Some(link) => self
                        .transport
                        .get(link)
                        .await
                        .map_err(|e| CoreError::remote("read job", e))?
                        .body
                        .unwrap_or(Value::Null),
                    None => continue,
                }
            } else {
                member
            };

            if let Ok(job) = serde_json::from_value::<JobRecord>(member) {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }

    /// Jobs still scheduled or running
    pub async fn unfinished(&self) -> Result<Vec<JobRecord>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|job| job.state.is_unfinished())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::transport::TransportResult;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const DELETE: &str = "/redfish/v1/Dell/Managers/iDRAC.Embedded.1/DellJobService/Actions/DellJobService.DeleteJobQueue";
    const JOBS: &str = "/redfish/v1/Managers/iDRAC.Embedded.1/Jobs";

    #[derive(Default)]
    struct Recorder {
        posts: Mutex<Vec<Value>>,
        fail_on: Option<&'static str>,
        collection: Option<Value>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn get(&self, uri: &str) -> TransportResult<RestResponse> {
            if uri.starts_with(JOBS) && uri.contains("$expand") {
                return Ok(RestResponse::new(200, self.collection.clone()));
            }
            let id = uri.rsplit('/').next().unwrap_or_default();
            Ok(RestResponse::new(
                200,
                Some(json!({"Id": id, "JobState": "Scheduled"})),
            ))
        }

        async fn post(&self, uri: &str, body: &Value) -> TransportResult<RestResponse> {
            assert_eq!(uri, DELETE);
            self.posts.lock().unwrap().push(body.clone());
            if self.fail_on == body["JobID"].as_str() {
                return Err(TransportError::from_status(500, uri, None));
            }
            Ok(RestResponse::new(200, Some(json!({"JobID": body["JobID"]}))))
        }
    }

    #[tokio::test]
    async fn test_clear_all_uses_sentinel() {
        let transport = Recorder::default();
        let queue = JobQueue::new(&transport, DELETE, JOBS);

        let responses = queue.clear(&JobSelection::All).await.unwrap();

        assert_eq!(responses.len(), 1);
        assert_eq!(
            *transport.posts.lock().unwrap(),
            vec![json!({"JobID": "JID_CLEARALL"})]
        );
    }

    #[tokio::test]
    async fn test_clear_every_listed_id_in_order() {
        let transport = Recorder::default();
        let queue = JobQueue::new(&transport, DELETE, JOBS);
        let selection = JobSelection::Ids(vec!["JID_1".into(), "JID_2".into(), "JID_3".into()]);

        let responses = queue.clear(&selection).await.unwrap();

        assert_eq!(responses.len(), 3);
        let sent: Vec<_> = transport
            .posts
            .lock()
            .unwrap()
            .iter()
            .map(|b| b["JobID"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(sent, vec!["JID_1", "JID_2", "JID_3"]);
    }

    #[tokio::test]
    async fn test_clear_stops_at_first_failure() {
        let transport = Recorder {
            fail_on: Some("JID_2"),
            ..Default::default()
        };
        let queue = JobQueue::new(&transport, DELETE, JOBS);
        let selection = JobSelection::Ids(vec!["JID_1".into(), "JID_2".into(), "JID_3".into()]);

        let err = queue.clear(&selection).await.unwrap_err();

        assert!(err.is_remote_operation());
        assert!(err.to_string().contains("JID_2"));
        assert_eq!(transport.posts.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_selection_from_ids() {
        assert_eq!(JobSelection::from(Vec::new()), JobSelection::All);
        assert_eq!(
            JobSelection::from(vec!["JID_9".to_string()]).job_ids(),
            vec!["JID_9"]
        );
        // The sentinel is built fresh each time
        let mut ids = JobSelection::All.job_ids();
        ids.push("JID_X".into());
        assert_eq!(JobSelection::All.job_ids(), vec![CLEAR_ALL_JOBS]);
    }

    #[tokio::test]
    async fn test_list_and_filter_unfinished() {
        let transport = Recorder {
            collection: Some(json!({
                "Members": [
                    {"Id": "JID_1", "JobState": "Completed", "Name": "Export"},
                    {"Id": "JID_2", "JobState": "Running", "PercentComplete": 40},
                    {"Id": "JID_3", "JobState": "SomethingNew"},
                    {"@odata.id": "/redfish/v1/Managers/iDRAC.Embedded.1/Jobs/JID_4"}
                ]
            })),
            ..Default::default()
        };
        let queue = JobQueue::new(&transport, DELETE, JOBS);

        let jobs = queue.list().await.unwrap();
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[2].state, JobState::Unknown);
        assert_eq!(jobs[3].id, "JID_4");

        let unfinished: Vec<_> = queue
            .unfinished()
            .await
            .unwrap()
            .into_iter()
            .map(|j| j.id)
            .collect();
        assert_eq!(unfinished, vec!["JID_2", "JID_4"]);
    }
}
