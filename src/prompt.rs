//! Prompt construction for the counselling model
//!
//! Produces `[system, ...recent history, user]`. Pure: no I/O, no clock.

use crate::conversation::{Role, Turn};
use crate::llm::ChatMessage;

/// Number of prior turns forwarded to the model
pub const HISTORY_WINDOW: usize = 10;

/// Base system prompt establishing the counsellor's role
pub const SYSTEM_PROMPT: &str = r"你是一位专业的AI心理咨询师，专门运用认知行为疗法(CBT)理论为用户提供心理健康支持。

你的职责：
1. 运用CBT理论帮助用户识别和改变负面思维模式
2. 提供情感支持和专业指导
3. 帮助用户建立健康的应对策略
4. 保持专业、温暖、非评判的态度

CBT核心技术：
- 思维记录：帮助识别自动化思维
- 认知重构：挑战和改变负面思维
- 行为实验：测试负面预期
- 问题解决：制定具体行动计划
- 放松训练：管理焦虑和压力
- 暴露疗法：逐步面对恐惧

回复要求：
1. 保持温暖、专业的语调
2. 使用CBT技术进行指导
3. 提供具体、可操作的建议
4. 避免诊断或开处方
5. 鼓励用户寻求专业帮助（如需要）
6. 回复长度控制在200-400字

重要提醒：
- 如果用户表达自杀或自伤想法，立即建议寻求紧急专业帮助
- 不要提供医疗诊断或药物建议
- 保持专业边界，不涉及个人信息";

/// The last [`HISTORY_WINDOW`] turns of `history`, oldest first.
pub fn recent_history(history: &[Turn]) -> &[Turn] {
    &history[history.len().saturating_sub(HISTORY_WINDOW)..]
}

/// Build the outbound message list.
///
/// Exactly one system message, then at most [`HISTORY_WINDOW`] history turns
/// in their original order, then exactly one user message. Content is never
/// truncated; only old turns are dropped.
pub fn build_messages(system: &str, history: &[Turn], user_message: &str) -> Vec<ChatMessage> {
    let recent = recent_history(history);
    let mut messages = Vec::with_capacity(recent.len() + 2);

    messages.push(ChatMessage::system(system));
    messages.extend(recent.iter().map(|turn| match turn.role {
        Role::User => ChatMessage::user(turn.content.clone()),
        Role::Assistant => ChatMessage::assistant(turn.content.clone()),
    }));
    messages.push(ChatMessage::user(user_message));

    messages
}
