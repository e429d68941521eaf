use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeColor {
    Gray,
    Green,
    Red,
    Yellow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeIcon {
    Clock,
    Check,
    Cross,
    Alert,
}

/// How a certificate status is presented to pensioners and admins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusBadge {
    pub color: BadgeColor,
    pub icon: BadgeIcon,
    pub label: String,
}

/// Fixed lookup; anything unrecognised (including `pending`) is gray/clock.
pub fn badge_for(status: &str) -> StatusBadge {
    let (color, icon) = match status {
        "approved" => (BadgeColor::Green, BadgeIcon::Check),
        "rejected" => (BadgeColor::Red, BadgeIcon::Cross),
        "needs_review" => (BadgeColor::Yellow, BadgeIcon::Alert),
        _ => (BadgeColor::Gray, BadgeIcon::Clock),
    };
    StatusBadge {
        color,
        icon,
        label: status.replace('_', " ").to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn badge_colors() {
        let colors: Vec<BadgeColor> = ["pending", "approved", "rejected", "needs_review", "unknown"]
            .into_iter()
            .map(|s| badge_for(s).color)
            .collect();
        assert_eq!(
            colors,
            vec![
                BadgeColor::Gray,
                BadgeColor::Green,
                BadgeColor::Red,
                BadgeColor::Yellow,
                BadgeColor::Gray
            ]
        );
    }

    #[test]
    fn badge_icons_and_labels() {
        assert_eq!(badge_for("approved").icon, BadgeIcon::Check);
        assert_eq!(badge_for("rejected").icon, BadgeIcon::Cross);
        assert_eq!(badge_for("needs_review").icon, BadgeIcon::Alert);
        assert_eq!(badge_for("pending").icon, BadgeIcon::Clock);
        assert_eq!(badge_for("needs_review").label, "NEEDS REVIEW");
        assert_eq!(badge_for("approved").label, "APPROVED");
    }
}
