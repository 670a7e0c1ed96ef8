//! Domain models for the charging function
//!
//! Usage reports and unit information exchanged with the session management
//! function, the credit-control and rating exchanges, and the exact
//! fixed-point value type used for tariffs.

pub mod charging_data;
pub mod credit_control;
pub mod monetary;
pub mod rating;

pub use charging_data::{
    ChargingDataRequest, ChargingDataResponse, ChargingNotifyRequest, FinalUnitAction,
    FinalUnitIndication, GrantedUnit, MultipleUnitInformation, MultipleUnitUsage,
    NfIdentification, NotificationType, QuotaManagementIndicator, ReauthorizationDetails,
    RequestedUnit, Trigger, TriggerCategory, TriggerType, UsedUnitContainer,
};
pub use credit_control::{
    AccountDebitRequest, AccountDebitResponse, CcRequestType, MultipleServicesCreditControl,
    RequestedAction, ServiceUnit, SubscriptionId, SubscriptionIdType, RESULT_CODE_SUCCESS,
};
pub use monetary::UnitValue;
pub use rating::{
    CcUnitType, MonetaryTariff, RateElement, RequestSubType, ServiceRating, ServiceRatingResult,
    ServiceUsageRequest, ServiceUsageResponse, TARIFF_CURRENCY_CODE,
};
