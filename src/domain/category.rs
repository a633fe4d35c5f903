use {
    serde::{Deserialize, Serialize},
    strum_macros::{Display, EnumCount, EnumIter},
};

/// The fixed classification taxonomy. Every accepted alert carries exactly one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumCount,
    Ord,
    PartialOrd,
    Default,
)]
pub enum Category {
    #[strum(to_string = "Traffic violation")]
    TrafficViolation,

    #[strum(to_string = "Person fall")]
    PersonFall,

    #[strum(to_string = "Abnormal object")]
    AbnormalObject,

    #[strum(to_string = "Crowding")]
    Crowding,

    #[strum(to_string = "Other")]
    #[default]
    Other,
}

impl Category {
    /// Operator-facing label used by the chart legend and list badges.
    pub fn label(&self) -> &'static str {
        match self {
            Category::TrafficViolation => "交通规则",
            Category::PersonFall => "人员跌倒",
            Category::AbnormalObject => "异常物品",
            Category::Crowding => "人员聚集",
            Category::Other => "其他异常",
        }
    }

    /// Dense index, stable across runs. Used by the counter table.
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}
