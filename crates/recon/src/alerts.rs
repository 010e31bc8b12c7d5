use crate::config::StatusConfig;
use crate::model::{AlertTag, ConsolidatedUser};

/// Which sources an email was found in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub system: bool,
    pub manual: bool,
    pub payments: bool,
}

/// Evaluate every alert predicate against a merged user. Predicates are
/// independent; the result keeps `AlertTag::ALL` order.
pub fn derive_alerts(presence: Presence, user: &ConsolidatedUser, status: &StatusConfig) -> Vec<AlertTag> {
    let payment_inactive = status.is_inactive(&user.payment_status);

    AlertTag::ALL
        .into_iter()
        .filter(|tag| match tag {
            AlertTag::ReviewManually => presence.system && !presence.manual,
            AlertTag::NoPayment => presence.system && !presence.payments,
            AlertTag::OutsideSystem => !presence.system && presence.manual,
            AlertTag::NoReferral => presence.system && user.referral.is_empty(),
            AlertTag::Inactive => presence.payments && payment_inactive,
            AlertTag::StatusDivergence => {
                presence.payments && status.is_active(&user.system_status) && payment_inactive
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presence(system: bool, manual: bool, payments: bool) -> Presence {
        Presence { system, manual, payments }
    }

    fn user(referral: &str, system_status: &str, payment_status: &str) -> ConsolidatedUser {
        ConsolidatedUser {
            email: "a@x.com".into(),
            referral: referral.into(),
            system_status: system_status.into(),
            payment_status: payment_status.into(),
            ..ConsolidatedUser::default()
        }
    }

    #[test]
    fn system_only_user() {
        let tags = derive_alerts(presence(true, false, false), &user("", "Active", ""), &StatusConfig::default());
        assert_eq!(
            tags,
            vec![AlertTag::ReviewManually, AlertTag::NoPayment, AlertTag::NoReferral]
        );
    }

    #[test]
    fn manual_only_user() {
        let tags = derive_alerts(presence(false, true, false), &user("", "", ""), &StatusConfig::default());
        assert_eq!(tags, vec![AlertTag::OutsideSystem]);
    }

    #[test]
    fn fully_present_clean_user() {
        let tags = derive_alerts(
            presence(true, true, true),
            &user("João", "Active", "Active"),
            &StatusConfig::default(),
        );
        assert!(tags.is_empty());
    }

    #[test]
    fn divergence_fires_with_inactive() {
        let tags = derive_alerts(
            presence(true, true, true),
            &user("João", "Active", "Historical"),
            &StatusConfig::default(),
        );
        assert_eq!(tags, vec![AlertTag::Inactive, AlertTag::StatusDivergence]);
    }

    #[test]
    fn inactive_without_divergence_when_system_not_active() {
        let tags = derive_alerts(
            presence(true, true, true),
            &user("João", "Suspended", "Inativo"),
            &StatusConfig::default(),
        );
        assert_eq!(tags, vec![AlertTag::Inactive]);
    }

    #[test]
    fn status_vocabulary_is_configurable() {
        let status = StatusConfig {
            active: vec!["on".into()],
            inactive: vec!["off".into()],
        };
        let tags = derive_alerts(presence(true, true, true), &user("x", "on", "off"), &status);
        assert_eq!(tags, vec![AlertTag::Inactive, AlertTag::StatusDivergence]);

        let tags = derive_alerts(presence(true, true, true), &user("x", "Active", "Historical"), &status);
        assert!(tags.is_empty());
    }
}
