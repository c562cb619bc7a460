//! Link discovery on the manager resource
//!
//! Only the handful of action targets and OEM service links the workflows
//! need are looked up. Everything else in the resource is ignored.

use serde_json::Value;
use url::Url;

use crate::error::{CoreError, Result};
use crate::transport::resolve_uri;

const IMPORT_ACTION_SUFFIX: &str = "#OemManager.ImportSystemConfiguration";
const MANAGER_RESET_ACTION: &str = "#Manager.Reset";
const JOB_SERVICE_PREFIX: &str = "DellJobService";
const LC_SERVICE_PREFIX: &str = "DellLCService";

const DELETE_JOB_QUEUE_ACTION: &str = "/Actions/DellJobService.DeleteJobQueue";
const REMOTE_API_STATUS_ACTION: &str = "/Actions/DellLCService.GetRemoteServicesAPIStatus";

/// Targets discovered on `/redfish/v1/Managers/<id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerEndpoints {
    /// Manager `Id`, also the component FQDD in configuration bundles
    pub identity: String,
    pub manager_uri: String,
    pub import_system_configuration: String,
    pub reset: String,
    pub job_service: String,
    pub lc_service: String,
    jobs: Option<String>,
}

impl ManagerEndpoints {
    /// Read the endpoints from a manager resource.
    ///
    /// Relative targets resolve against `base`. A missing action or link is
    /// [`CoreError::MissingLink`].
    pub fn from_manager_json(base: &Url, manager: &Value) -> Result<Self> {
        let identity = manager
            .get("Id")
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::MissingLink("Id".to_string()))?
            .to_string();

        let manager_uri = match manager.get("@odata.id").and_then(Value::as_str) {
            Some(uri) => resolve(base, uri)?,
            None => resolve(base, &format!("/redfish/v1/Managers/{}", identity))?,
        };

        let actions = manager.get("Actions");
        let action_sections = [actions, actions.and_then(|a| a.get("Oem"))];

        let import_system_configuration = find_entry(&action_sections, |key| {
            key.ends_with(IMPORT_ACTION_SUFFIX)
        })
        .and_then(|action| action.get("target"))
        .and_then(Value::as_str)
        .ok_or_else(|| CoreError::MissingLink(IMPORT_ACTION_SUFFIX.to_string()))?;

        let reset = find_entry(&action_sections, |key| key == MANAGER_RESET_ACTION)
            .and_then(|action| action.get("target"))
            .and_then(Value::as_str)
            .ok_or_else(|| CoreError::MissingLink(MANAGER_RESET_ACTION.to_string()))?;

        let links = manager.get("Links");
        let oem = links.and_then(|l| l.get("Oem"));
        let link_sections = [links, oem, oem.and_then(|o| o.get("Dell"))];

        let job_service = odata_id(&link_sections, |key| key.starts_with(JOB_SERVICE_PREFIX))
            .ok_or_else(|| CoreError::MissingLink(JOB_SERVICE_PREFIX.to_string()))?;
        let lc_service = odata_id(&link_sections, |key| key.starts_with(LC_SERVICE_PREFIX))
            .ok_or_else(|| CoreError::MissingLink(LC_SERVICE_PREFIX.to_string()))?;
        let jobs = odata_id(&link_sections, |key| key == "Jobs");

        Ok(Self {
            identity,
            manager_uri,
            import_system_configuration: resolve(base, import_system_configuration)?,
            reset: resolve(base, reset)?,
            job_service: resolve(base, job_service)?,
            lc_service: resolve(base, lc_service)?,
            jobs: jobs.map(|uri| resolve(base, uri)).transpose()?,
        })
    }

    /// `DellJobService.DeleteJobQueue` action target
    pub fn delete_job_queue_uri(&self) -> String {
        format!("{}{}", self.job_service.trim_end_matches('/'), DELETE_JOB_QUEUE_ACTION)
    }

    /// `DellLCService.GetRemoteServicesAPIStatus` action target
    pub fn remote_api_status_uri(&self) -> String {
        format!("{}{}", self.lc_service.trim_end_matches('/'), REMOTE_API_STATUS_ACTION)
    }

    /// Job collection; the manager's `Jobs` subresource unless linked
    pub fn jobs_uri(&self) -> String {
        match &self.jobs {
            Some(uri) => uri.clone(),
            None => format!("{}/Jobs", self.manager_uri.trim_end_matches('/')),
        }
    }
}

fn find_entry<'a>(sections: &[Option<&'a Value>], matches: impl Fn(&str) -> bool) -> Option<&'a Value> {
    sections
        .iter()
        .flatten()
        .filter_map(|section| section.as_object())
        .flat_map(|map| map.iter())
        .find(|(key, _)| matches(key))
        .map(|(_, value)| value)
}

fn odata_id<'a>(sections: &[Option<&'a Value>], matches: impl Fn(&str) -> bool) -> Option<&'a str> {
    find_entry(sections, matches)
        .and_then(|link| link.get("@odata.id"))
        .and_then(Value::as_str)
}

fn resolve(base: &Url, uri: &str) -> Result<String> {
    resolve_uri(base, uri)
        .map(String::from)
        .map_err(|e| CoreError::InvalidParameter(e.to_string()))
}
