//! # Chat Reply Generation
//!
//! Canned assistant replies chosen by keyword matching. There is no model
//! behind this; the [`ReplyGenerator`] trait is the seam where one would be
//! plugged in without touching the HTTP or websocket layers.
//!
//! ## Matching Rules:
//! The message is lower-cased and checked against keyword groups in a fixed
//! order (news, writing, preview, help). The first group with any keyword
//! contained in the message decides the reply; otherwise a fallback that
//! quotes the message is returned.

/// Produces the assistant's answer to one user message.
pub trait ReplyGenerator: Send + Sync {
    fn reply(&self, message: &str) -> String;
}

/// A keyword group and the canned reply it selects.
struct ReplyRule {
    keywords: &'static [&'static str],
    reply: &'static str,
}

const RULES: &[ReplyRule] = &[
    ReplyRule {
        keywords: &["资讯", "新闻", "最新", "技术"],
        reply: "🔍 找到了3条增材制造最新资讯：\n\n\
📈 **技术突破**：新型陶瓷3D打印材料发布，耐高温性能提升60%\n\
🏭 **产业动态**：西门子宣布在华建设金属3D打印研发中心\n\
💰 **投资热点**：某3D打印初创公司完成5000万A轮融资\n\n\
点击任意链接获取详细分析，或告诉我\"生成报告\"为您制作深度分析稿件。",
    },
    ReplyRule {
        keywords: &["写", "生成", "文章", "稿件", "报告"],
        reply: "✍️ 正在为您生成专业内容稿件...\n\n\
📋 **建议结构**：\n\
• 标题：抓住核心技术亮点\n\
• 导语：30秒快速吸引读者注意力\n\
• 主体：数据支撑+案例分析+行业对比\n\
• 结语：趋势预判和投资建议\n\n\
🎯 **预览功能**：稿件生成后将自动弹出预览窗口，支持实时编辑和格式调整。\n\n\
请提供具体主题或选择上述资讯，我将为您量身定制高质量内容。",
    },
    ReplyRule {
        keywords: &["预览", "编辑", "发布"],
        reply: "🖥️ 启动预览IDE模式...\n\n\
将为您打开：\n\
• 📝 所见即所得的编辑界面\n\
• 🎨 多平台适配预览（微信公众号/小红书/知乎）\n\
• 📊 内容质量评分和SEO优化建议\n\
• 🚀 一键发布到各大平台\n\n\
点击下方链接进入预览模式：\n\
🔗 [打开预览IDE] (模拟链接，实际会触发弹窗)",
    },
    ReplyRule {
        keywords: &["帮助", "功能", "怎么用", "介绍"],
        reply: "👋 欢迎使用西冷资讯AI协作OS！\n\n\
🌟 **核心能力**：\n\
🔍 **智能资讯搜集**：实时抓取行业最新动态\n\
✍️ **专业内容创作**：生成高质量媒体稿件\n\
🎙️ **语音交互**：按住说话，解放双手操作\n\
📱 **多平台适配**：一稿多投，自动格式优化\n\
🖥️ **实时预览IDE**：所见即所得编辑体验\n\n\
💡 **试试这些指令**：\n\
• \"找今天3D打印的最新突破\"\n\
• \"写一篇金属打印的深度分析\"\n\
• \"语音输入功能测试\"\n\n\
开始您的AI协作之旅吧！",
    },
];

/// Keyword-matching reply generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordReplies;

impl ReplyGenerator for KeywordReplies {
    fn reply(&self, message: &str) -> String {
        let lowered = message.to_lowercase();

        RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|keyword| lowered.contains(keyword)))
            .map(|rule| rule.reply.to_string())
            .unwrap_or_else(|| fallback_reply(message))
    }
}

fn fallback_reply(message: &str) -> String {
    format!(
        "💬 收到您的消息：\"{}\"\n\n\
🤖 我是西冷资讯AI协作OS，专注于增材制造/3D打印领域的智能内容协作。\n\n\
🎯 **即刻体验**：\n\
• 语音交互：长按录音键说话\n\
• 资讯搜索：告诉我您关注的技术方向\n\
• 内容创作：让我为您写专业分析稿\n\n\
有什么我可以帮助您的吗？让我们开始高效的人机协作！",
        message
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_groups() {
        let replies = KeywordReplies;
        assert!(replies.reply("有什么最新资讯").starts_with("🔍"));
        assert!(replies.reply("帮我写一篇文章").starts_with("✍️"));
        assert!(replies.reply("打开预览").starts_with("🖥️"));
        assert!(replies.reply("怎么用这个系统").starts_with("👋"));
    }

    #[test]
    fn test_first_matching_group_wins() {
        // "技术" (news) and "报告" (writing) both match; news comes first
        assert!(KeywordReplies.reply("技术报告").starts_with("🔍"));
    }

    #[test]
    fn test_fallback_quotes_message() {
        let reply = KeywordReplies.reply("hello there");
        assert!(reply.starts_with("💬"));
        assert!(reply.contains("\"hello there\""));
    }

    #[test]
    fn test_reply_is_deterministic() {
        assert_eq!(KeywordReplies.reply("发布"), KeywordReplies.reply("发布"));
    }
}
