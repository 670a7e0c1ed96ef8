//! Charging data models (Nchf converged charging)
//!
//! Usage reports received from the session management function and the unit
//! information returned to it. Field names follow the 3GPP JSON encoding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Quota management indicator of a used-unit container
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuotaManagementIndicator {
    #[default]
    OfflineCharging,
    OnlineCharging,
    QuotaManagementSuspended,
}

/// Trigger type
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
    QuotaThreshold,
    QuotaExhausted,
    ValidityTime,
    VolumeLimit,
    TimeLimit,
    Final,
    #[serde(other)]
    Other,
}

/// Whether a trigger must be reported immediately or with the next report
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerCategory {
    ImmediateReport,
    DeferredReport,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Trigger {
    pub trigger_type: TriggerType,
    pub trigger_category: TriggerCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit: Option<u32>,
}

impl Trigger {
    pub fn volume_limit(category: TriggerCategory, limit: u32) -> Self {
        Self {
            trigger_type: TriggerType::VolumeLimit,
            trigger_category: category,
            volume_limit: Some(limit),
            time_limit: None,
        }
    }

    /// Volume limit reached with immediate reporting: the open record must roll over
    pub fn forces_partial_record(&self) -> bool {
        self.trigger_type == TriggerType::VolumeLimit
            && self.trigger_category == TriggerCategory::ImmediateReport
    }

    pub fn is_final(&self) -> bool {
        self.trigger_type == TriggerType::Final
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RequestedUnit {
    #[serde(default)]
    pub total_volume: u64,
    #[serde(default)]
    pub uplink_volume: u64,
    #[serde(default)]
    pub downlink_volume: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsedUnitContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<u32>,
    #[serde(default)]
    pub quota_management_indicator: QuotaManagementIndicator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub total_volume: u64,
    #[serde(default)]
    pub uplink_volume: u64,
    #[serde(default)]
    pub downlink_volume: u64,
    #[serde(default)]
    pub local_sequence_number: u32,
}

/// Usage of one rating group within a report
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultipleUnitUsage {
    pub rating_group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_unit: Option<RequestedUnit>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub used_unit_container: Vec<UsedUnitContainer>,
    #[serde(rename = "uPFID", default, skip_serializing_if = "Option::is_none")]
    pub upf_id: Option<String>,
}

impl MultipleUnitUsage {
    pub fn requested_volume(&self) -> u64 {
        self.requested_unit
            .as_ref()
            .map(|unit| unit.total_volume)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NfIdentification {
    #[serde(rename = "nFName", default, skip_serializing_if = "Option::is_none")]
    pub nf_name: Option<String>,
    #[serde(rename = "nFIPv4Address", default, skip_serializing_if = "Option::is_none")]
    pub nf_ipv4_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_functionality: Option<String>,
}

/// Usage report (charging data request)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChargingDataRequest {
    #[validate(length(min = 1, message = "Subscriber identifier is required"))]
    pub subscriber_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nf_consumer_identification: Option<NfIdentification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invocation_time_stamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub invocation_sequence_number: u32,
    #[serde(default)]
    pub one_time_event: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multiple_unit_usage: Vec<MultipleUnitUsage>,
}

impl ChargingDataRequest {
    /// NF name of the consumer, empty when not supplied
    pub fn consumer_name(&self) -> &str {
        self.nf_consumer_identification
            .as_ref()
            .and_then(|nf| nf.nf_name.as_deref())
            .unwrap_or("")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalUnitAction {
    Terminate,
    Redirect,
    RestrictAccess,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinalUnitIndication {
    pub final_unit_action: FinalUnitAction,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GrantedUnit {
    pub total_volume: u64,
    pub uplink_volume: u64,
    pub downlink_volume: u64,
}

impl GrantedUnit {
    /// Same volume in every direction
    pub fn symmetric(volume: u64) -> Self {
        Self {
            total_volume: volume,
            uplink_volume: volume,
            downlink_volume: volume,
        }
    }
}

/// Unit information returned for one rating group
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MultipleUnitInformation {
    pub rating_group: u32,
    #[serde(rename = "uPFID", default, skip_serializing_if = "Option::is_none")]
    pub upf_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granted_unit: Option<GrantedUnit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_unit_indication: Option<FinalUnitIndication>,
    #[serde(default)]
    pub volume_quota_threshold: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validity_time: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<Trigger>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingDataResponse {
    pub invocation_time_stamp: DateTime<Utc>,
    pub invocation_sequence_number: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub multiple_unit_information: Vec<MultipleUnitInformation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    Reauthorization,
    AbortCharging,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReauthorizationDetails {
    pub rating_group: u32,
}

/// Charging notification sent to the subscriber's notify URI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChargingNotifyRequest {
    pub notification_type: NotificationType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reauthorization_details: Vec<ReauthorizationDetails>,
}

impl ChargingNotifyRequest {
    pub fn reauthorize(rating_group: u32) -> Self {
        Self {
            notification_type: NotificationType::Reauthorization,
            reauthorization_details: vec![ReauthorizationDetails { rating_group }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_report_deserialization() {
        let json = r#"{
            "subscriberIdentifier": "imsi-208930000000001",
            "nfConsumerIdentification": {"nFName": "SMF"},
            "invocationSequenceNumber": 3,
            "triggers": [
                {"triggerType": "VOLUME_LIMIT", "triggerCategory": "IMMEDIATE_REPORT", "volumeLimit": 5000}
            ],
            "multipleUnitUsage": [{
                "ratingGroup": 5,
                "requestedUnit": {"totalVolume": 100},
                "usedUnitContainer": [
                    {"quotaManagementIndicator": "ONLINE_CHARGING", "totalVolume": 50}
                ],
                "uPFID": "upf-1"
            }]
        }"#;

        let request: ChargingDataRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.consumer_name(), "SMF");
        assert_eq!(request.invocation_sequence_number, 3);
        assert!(request.triggers[0].forces_partial_record());

        let usage = &request.multiple_unit_usage[0];
        assert_eq!(usage.rating_group, 5);
        assert_eq!(usage.requested_volume(), 100);
        assert_eq!(usage.upf_id.as_deref(), Some("upf-1"));
        assert_eq!(
            usage.used_unit_container[0].quota_management_indicator,
            QuotaManagementIndicator::OnlineCharging
        );
    }

    #[test]
    fn test_missing_indicator_defaults_to_offline() {
        let container: UsedUnitContainer = serde_json::from_str(r#"{"totalVolume": 10}"#).unwrap();
        assert_eq!(
            container.quota_management_indicator,
            QuotaManagementIndicator::OfflineCharging
        );
    }

    #[test]
    fn test_unknown_trigger_type() {
        let trigger: Trigger = serde_json::from_str(
            r#"{"triggerType": "PLMN_CHANGE", "triggerCategory": "DEFERRED_REPORT"}"#,
        )
        .unwrap();
        assert_eq!(trigger.trigger_type, TriggerType::Other);
        assert!(!trigger.forces_partial_record());
    }

    #[test]
    fn test_reauthorize_notification_shape() {
        let body = serde_json::to_value(ChargingNotifyRequest::reauthorize(7)).unwrap();
        assert_eq!(body["notificationType"], "REAUTHORIZATION");
        assert_eq!(body["reauthorizationDetails"][0]["ratingGroup"], 7);
    }
}
