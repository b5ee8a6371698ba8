//! 健康数据类型
//!
//! HealthKit 类型标识符与友好名称字典

use crate::error::{HealthError, HealthResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

macro_rules! health_data_types {
    ($($variant:ident => $friendly:tt, $identifier:tt;)+) => {
        /// 解析器支持的记录类型
        ///
        /// 序列化为原始标识符，例如 `HKQuantityTypeIdentifierStepCount`
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum HealthDataType {
            $(
                #[serde(rename = $identifier)]
                $variant,
            )+
        }

        impl HealthDataType {
            /// 全部类型，按字典顺序
            pub const ALL: &'static [HealthDataType] = &[$(HealthDataType::$variant),+];

            /// `type` 属性中的原始标识符
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(HealthDataType::$variant => $identifier,)+
                }
            }

            /// 小写的字典键
            pub fn friendly_name(&self) -> &'static str {
                match self {
                    $(HealthDataType::$variant => $friendly,)+
                }
            }

            /// 解析原始标识符（精确匹配）
            pub fn from_identifier(identifier: &str) -> Option<Self> {
                match identifier {
                    $($identifier => Some(HealthDataType::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

health_data_types! {
    Height => "height", "HKQuantityTypeIdentifierHeight";
    BodyMass => "bodymass", "HKQuantityTypeIdentifierBodyMass";
    StepCount => "stepcount", "HKQuantityTypeIdentifierStepCount";
    ActiveEnergyBurned => "activeenergyburned", "HKQuantityTypeIdentifierActiveEnergyBurned";
    DistanceWalkingRunning => "distancewalkingrunning", "HKQuantityTypeIdentifierDistanceWalkingRunning";
    FlightsClimbed => "flightsclimbed", "HKQuantityTypeIdentifierFlightsClimbed";
    WalkingSpeed => "walkingspeed", "HKQuantityTypeIdentifierWalkingSpeed";
    WalkingAsymmetryPercentage => "walkingasymmetrypercentage", "HKQuantityTypeIdentifierWalkingAsymmetryPercentage";
    WalkingDoubleSupportPercentage => "walkingdoublesupportpercentage", "HKQuantityTypeIdentifierWalkingDoubleSupportPercentage";
    WalkingStepLength => "walkingsteplength", "HKQuantityTypeIdentifierWalkingStepLength";
    HeartRateVariabilitySdnn => "heartratevariabilitysdnn", "HKQuantityTypeIdentifierHeartRateVariabilitySDNN";
    PhysicalEffort => "physicaleffort", "HKQuantityTypeIdentifierPhysicalEffort";
    HeartRate => "heartrate", "HKQuantityTypeIdentifierHeartRate";
    RespiratoryRate => "respiratoryrate", "HKQuantityTypeIdentifierRespiratoryRate";
    MindfulSession => "mindfulsession", "HKCategoryTypeIdentifierMindfulSession";
    CervicalMucusQuality => "cervicalmucusquality", "HKCategoryTypeIdentifierCervicalMucusQuality";
    OxygenSaturation => "oxygensaturation", "HKQuantityTypeIdentifierOxygenSaturation";
    HeadphoneAudioExposure => "headphoneaudioexposure", "HKQuantityTypeIdentifierHeadphoneAudioExposure";
    AppleWalkingSteadiness => "applewalkingsteadiness", "HKQuantityTypeIdentifierAppleWalkingSteadiness";
    SleepDurationGoal => "sleepdurationgoal", "HKDataTypeSleepDurationGoal";
    SleepAnalysis => "sleepanalysis", "HKCategoryTypeIdentifierSleepAnalysis";
    BasalEnergyBurned => "basalenergyburned", "HKQuantityTypeIdentifierBasalEnergyBurned";
}

impl fmt::Display for HealthDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未指定类型时使用的默认友好名称
pub const DEFAULT_FRIENDLY_TYPES: &[&str] = &[
    "height",
    "bodyMass",
    "stepCount",
    "activeEnergyBurned",
    "distanceWalkingRunning",
    "flightsClimbed",
    "walkingSpeed",
    "walkingAsymmetryPercentage",
    "walkingDoubleSupportPercentage",
    "walkingStepLength",
    "heartRate",
    "respiratoryRate",
    "oxygenSaturation",
    "basalEnergyBurned",
    "sleepDurationGoal",
    "sleepAnalysis",
    "physicalEffort",
];

static TYPE_DICTIONARY: Lazy<HashMap<&'static str, HealthDataType>> = Lazy::new(|| {
    HealthDataType::ALL
        .iter()
        .map(|ty| (ty.friendly_name(), *ty))
        .collect()
});

/// 查找友好名称，不区分大小写，未知名称返回 `None`
pub fn lookup(friendly_name: &str) -> Option<HealthDataType> {
    TYPE_DICTIONARY
        .get(friendly_name.to_lowercase().as_str())
        .copied()
}

/// 解析全部友好名称，遇到第一个未知名称即失败
pub fn resolve_types<S: AsRef<str>>(friendly_names: &[S]) -> HealthResult<Vec<HealthDataType>> {
    friendly_names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            lookup(name).ok_or_else(|| HealthError::UnknownType(name.to_string()))
        })
        .collect()
}
