pub mod billing;
pub mod currency;
pub mod dates;
pub mod feature;
pub mod notification;
pub mod status;

pub use billing::{BillingCycleType, calculate_yearly_projection, convert_to_monthly};
pub use notification::NotificationType;
pub use status::SubscriptionStatus;
