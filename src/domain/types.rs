// ==========================================
// OEE Calculation Service - domain type definitions
// ==========================================
// Machine state vocabulary and tag-condition
// primitives shared by calculators, telemetry
// mapping and the tag monitor.
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// Machine state (state-tracking measurement)
// ==========================================
// Serialized lower-case, matching the state values
// written by the edge collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineState {
    Running,
    Stopped,
    Faulted,
    Idle,
    Changeover,
    PlannedDowntime,
}

impl MachineState {
    pub const ALL: [MachineState; 6] = [
        MachineState::Running,
        MachineState::Stopped,
        MachineState::Faulted,
        MachineState::Idle,
        MachineState::Changeover,
        MachineState::PlannedDowntime,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::Running => "running",
            MachineState::Stopped => "stopped",
            MachineState::Faulted => "faulted",
            MachineState::Idle => "idle",
            MachineState::Changeover => "changeover",
            MachineState::PlannedDowntime => "planned_downtime",
        }
    }

    /// Parse a state name case-insensitively. Unknown states return None
    /// and are ignored by the telemetry mapping step.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "running" => Some(MachineState::Running),
            "stopped" => Some(MachineState::Stopped),
            "faulted" => Some(MachineState::Faulted),
            "idle" => Some(MachineState::Idle),
            "changeover" => Some(MachineState::Changeover),
            "planned_downtime" => Some(MachineState::PlannedDowntime),
            _ => None,
        }
    }
}

impl fmt::Display for MachineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Tag type (downtime tag monitoring)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagType {
    Digital,
    Analog,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Digital => "digital",
            TagType::Analog => "analog",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "digital" => Some(TagType::Digital),
            "analog" => Some(TagType::Analog),
            _ => None,
        }
    }
}

// ==========================================
// Analog comparison operator
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalogOperator {
    Gt,
    Ge,
    Lt,
    Le,
    Eq,
}

impl AnalogOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalogOperator::Gt => ">",
            AnalogOperator::Ge => ">=",
            AnalogOperator::Lt => "<",
            AnalogOperator::Le => "<=",
            AnalogOperator::Eq => "==",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ">" => Some(AnalogOperator::Gt),
            ">=" => Some(AnalogOperator::Ge),
            "<" => Some(AnalogOperator::Lt),
            "<=" => Some(AnalogOperator::Le),
            "==" => Some(AnalogOperator::Eq),
            _ => None,
        }
    }

    /// Apply the operator: `value <op> threshold`.
    pub fn evaluate(&self, value: f64, threshold: f64) -> bool {
        match self {
            AnalogOperator::Gt => value > threshold,
            AnalogOperator::Ge => value >= threshold,
            AnalogOperator::Lt => value < threshold,
            AnalogOperator::Le => value <= threshold,
            AnalogOperator::Eq => value == threshold,
        }
    }
}

impl fmt::Display for AnalogOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
