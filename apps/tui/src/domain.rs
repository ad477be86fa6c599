/// Pacing decision attached to each event by the upstream decision engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Pivot,
    Push,
    Maintain,
    Coast,
    NotStarted,
}

impl Decision {
    pub const ALL: [Self; 5] = [
        Self::Pivot,
        Self::Push,
        Self::Maintain,
        Self::Coast,
        Self::NotStarted,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pivot => "pivot",
            Self::Push => "push",
            Self::Maintain => "maintain",
            Self::Coast => "coast",
            Self::NotStarted => "not_started",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "pivot" => Some(Self::Pivot),
            "push" => Some(Self::Push),
            "maintain" => Some(Self::Maintain),
            "coast" => Some(Self::Coast),
            "not_started" => Some(Self::NotStarted),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pivot => "Pivot",
            Self::Push => "Push",
            Self::Maintain => "Maintain",
            Self::Coast => "Coast",
            Self::NotStarted => "Not started",
        }
    }

    /// One-line guidance shown next to the decision badge.
    pub const fn summary(self) -> &'static str {
        match self {
            Self::Pivot => "Pacing well behind history; change the plan",
            Self::Push => "Behind pace; increase spend and outreach",
            Self::Maintain => "On pace; keep the current plan",
            Self::Coast => "Ahead of pace; reduce spend",
            Self::NotStarted => "Sales have not started yet",
        }
    }
}

/// Targeting audiences computed upstream for a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudienceKey {
    PastAttendees,
    CityProspects,
    TypeFans,
    AtRisk,
}

impl AudienceKey {
    pub const ALL: [Self; 4] = [
        Self::PastAttendees,
        Self::CityProspects,
        Self::TypeFans,
        Self::AtRisk,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PastAttendees => "past_attendees",
            Self::CityProspects => "city_prospects",
            Self::TypeFans => "type_fans",
            Self::AtRisk => "at_risk",
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::PastAttendees),
            1 => Some(Self::CityProspects),
            2 => Some(Self::TypeFans),
            3 => Some(Self::AtRisk),
            _ => None,
        }
    }

    /// Fallback title used when the payload carries no label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::PastAttendees => "Past Attendees",
            Self::CityProspects => "City Prospects",
            Self::TypeFans => "Type Fans",
            Self::AtRisk => "Win-Back Targets",
        }
    }
}

/// Audiences exportable from the intelligence report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntelligenceAudience {
    CrossSell,
    SuperSpreaders,
    Vips,
    ChurnCritical,
    ChurnUrgent,
}

impl IntelligenceAudience {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CrossSell => "cross_sell",
            Self::SuperSpreaders => "super_spreaders",
            Self::Vips => "vips",
            Self::ChurnCritical => "churn_critical",
            Self::ChurnUrgent => "churn_urgent",
        }
    }
}

/// Slices of an attendee-overlap pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlapAudience {
    Overlap,
    OnlyA,
    OnlyB,
}

impl OverlapAudience {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overlap => "overlap",
            Self::OnlyA => "only_a",
            Self::OnlyB => "only_b",
        }
    }
}

/// RFM classification assigned upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    Champion,
    Loyal,
    Potential,
    AtRisk,
    Hibernating,
    Other,
}

impl Segment {
    pub const ALL: [Self; 6] = [
        Self::Champion,
        Self::Loyal,
        Self::Potential,
        Self::AtRisk,
        Self::Hibernating,
        Self::Other,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Champion => "champion",
            Self::Loyal => "loyal",
            Self::Potential => "potential",
            Self::AtRisk => "at_risk",
            Self::Hibernating => "hibernating",
            Self::Other => "other",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "champion" => Some(Self::Champion),
            "loyal" => Some(Self::Loyal),
            "potential" => Some(Self::Potential),
            "at_risk" => Some(Self::AtRisk),
            "hibernating" => Some(Self::Hibernating),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Champion => "Champion",
            Self::Loyal => "Loyal",
            Self::Potential => "Potential",
            Self::AtRisk => "At Risk",
            Self::Hibernating => "Hibernating",
            Self::Other => "Other",
        }
    }
}

/// When a customer tends to buy relative to the event date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimingSegment {
    SuperEarlyBird,
    EarlyBird,
    Planner,
    Spontaneous,
    LastMinute,
}

impl TimingSegment {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperEarlyBird => "super_early_bird",
            Self::EarlyBird => "early_bird",
            Self::Planner => "planner",
            Self::Spontaneous => "spontaneous",
            Self::LastMinute => "last_minute",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "super_early_bird" => Some(Self::SuperEarlyBird),
            "early_bird" => Some(Self::EarlyBird),
            "planner" => Some(Self::Planner),
            "spontaneous" => Some(Self::Spontaneous),
            "last_minute" => Some(Self::LastMinute),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::SuperEarlyBird => "Super early bird",
            Self::EarlyBird => "Early bird",
            Self::Planner => "Planner",
            Self::Spontaneous => "Spontaneous",
            Self::LastMinute => "Last minute",
        }
    }
}

/// Sortable columns accepted by `/api/customers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    LtvScore,
    TotalSpent,
    TotalOrders,
    TotalEvents,
    DaysSinceLast,
    AvgOrderValue,
}

impl SortField {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LtvScore => "ltv_score",
            Self::TotalSpent => "total_spent",
            Self::TotalOrders => "total_orders",
            Self::TotalEvents => "total_events",
            Self::DaysSinceLast => "days_since_last",
            Self::AvgOrderValue => "avg_order_value",
        }
    }

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::LtvScore),
            1 => Some(Self::TotalSpent),
            2 => Some(Self::TotalOrders),
            3 => Some(Self::TotalEvents),
            4 => Some(Self::DaysSinceLast),
            5 => Some(Self::AvgOrderValue),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::LtvScore => "LTV",
            Self::TotalSpent => "Spent",
            Self::TotalOrders => "Orders",
            Self::TotalEvents => "Events",
            Self::DaysSinceLast => "Last seen",
            Self::AvgOrderValue => "AOV",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortOrder {
    Desc,
    Asc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desc => "DESC",
            Self::Asc => "ASC",
        }
    }

    pub const fn toggled(self) -> Self {
        match self {
            Self::Desc => Self::Asc,
            Self::Asc => Self::Desc,
        }
    }

    pub const fn arrow(self) -> &'static str {
        match self {
            Self::Desc => "▼",
            Self::Asc => "▲",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_labels_round_trip_through_parse() {
        for decision in Decision::ALL {
            assert_eq!(Decision::parse(decision.as_str()), Some(decision));
        }
        assert_eq!(Decision::parse(" PUSH "), Some(Decision::Push));
        assert_eq!(Decision::parse("panic"), None);
    }

    #[test]
    fn unknown_segments_and_timings_do_not_parse() {
        assert_eq!(Segment::parse("whale"), None);
        assert_eq!(TimingSegment::parse(""), None);
        assert_eq!(Segment::parse("at_risk"), Some(Segment::AtRisk));
        assert_eq!(
            TimingSegment::parse("last_minute"),
            Some(TimingSegment::LastMinute)
        );
    }

    #[test]
    fn sort_order_toggles() {
        assert_eq!(SortOrder::Desc.toggled(), SortOrder::Asc);
        assert_eq!(SortOrder::Asc.toggled(), SortOrder::Desc);
    }
}
