//! Keyword heuristics labelling a reply with an emotion and a CBT technique
//!
//! Both lookups walk an ordered table and stop at the first category with a
//! keyword contained in the text. Matching is plain case-sensitive substring
//! containment. The labels are coarse tags for display, not an assessment.

use serde::Serialize;
use std::fmt;

/// Emotion detected in the user's message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Emotion {
    #[serde(rename = "焦虑")]
    Anxiety,
    #[serde(rename = "抑郁")]
    Depression,
    #[serde(rename = "愤怒")]
    Anger,
    #[serde(rename = "压力")]
    Stress,
    #[serde(rename = "中性")]
    Neutral,
}

impl Emotion {
    pub fn label(self) -> &'static str {
        match self {
            Self::Anxiety => "焦虑",
            Self::Depression => "抑郁",
            Self::Anger => "愤怒",
            Self::Stress => "压力",
            Self::Neutral => "中性",
        }
    }
}

/// CBT technique the reply appears to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Technique {
    #[serde(rename = "认知重构")]
    CognitiveRestructuring,
    #[serde(rename = "行为激活")]
    BehavioralActivation,
    #[serde(rename = "放松训练")]
    RelaxationTraining,
    #[serde(rename = "问题解决")]
    ProblemSolving,
    #[serde(rename = "倾听与共情")]
    ListeningAndEmpathy,
}

impl Technique {
    pub fn label(self) -> &'static str {
        match self {
            Self::CognitiveRestructuring => "认知重构",
            Self::BehavioralActivation => "行为激活",
            Self::RelaxationTraining => "放松训练",
            Self::ProblemSolving => "问题解决",
            Self::ListeningAndEmpathy => "倾听与共情",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for Technique {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Emotion categories in match priority order
pub const EMOTION_TABLE: &[(Emotion, &[&str])] = &[
    (Emotion::Anxiety, &["焦虑", "担心", "紧张", "害怕", "恐惧", "不安"]),
    (Emotion::Depression, &["抑郁", "难过", "沮丧", "绝望", "无助", "空虚"]),
    (Emotion::Anger, &["生气", "愤怒", "恼火", "烦躁", "愤恨"]),
    (Emotion::Stress, &["压力", "疲惫", "累", "忙", "负担"]),
];

/// Technique categories in match priority order
pub const TECHNIQUE_TABLE: &[(Technique, &[&str])] = &[
    (Technique::CognitiveRestructuring, &["想法", "思维", "认知", "重新思考"]),
    (Technique::BehavioralActivation, &["行动", "活动", "做些", "尝试"]),
    (Technique::RelaxationTraining, &["放松", "深呼吸", "冥想", "平静"]),
    (Technique::ProblemSolving, &["解决", "计划", "步骤", "方法"]),
];

/// Result of annotating one exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Annotation {
    pub emotion: Emotion,
    pub technique: Technique,
}

fn first_match<L: Copy>(table: &[(L, &[&str])], text: &str) -> Option<L> {
    table
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| text.contains(kw)))
        .map(|(label, _)| *label)
}

pub fn detect_emotion(user_message: &str) -> Emotion {
    first_match(EMOTION_TABLE, user_message).unwrap_or(Emotion::Neutral)
}

pub fn detect_technique(reply: &str) -> Technique {
    first_match(TECHNIQUE_TABLE, reply).unwrap_or(Technique::ListeningAndEmpathy)
}

/// Emotion comes from the user's words, technique from the model's reply.
pub fn annotate(user_message: &str, reply: &str) -> Annotation {
    Annotation {
        emotion: detect_emotion(user_message),
        technique: detect_technique(reply),
    }
}
