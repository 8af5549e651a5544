use super::Transcriber;

/// Marker prepended to streamed transcripts so clients can tell they are fake.
pub const STREAM_PREFIX: &str = "这是模拟的语音转文字结果：";

/// Size-bucketed canned transcripts.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockTranscriber;

impl Transcriber for MockTranscriber {
    fn transcribe_upload(&self, file_size: usize) -> String {
        let file_size_kb = file_size / 1024;

        let text = if file_size_kb < 10 {
            "用户说：帮我找一下最新的金属3D打印技术突破。"
        } else if file_size_kb < 50 {
            "用户说：我需要写一篇关于增材制造行业发展现状的深度分析文章，请帮我收集相关的市场数据、技术趋势和典型应用案例。"
        } else {
            "用户说：请为我生成一份详细的增材制造行业报告，包括全球市场规模、主要技术路线对比、重点厂商分析、应用领域拓展情况，以及未来三年的发展趋势预测。这份报告将用于我们公司的战略投资决策。"
        };

        text.to_string()
    }

    fn transcribe_stream(&self, audio_len: usize) -> String {
        let phrase = if audio_len < 10_000 {
            "找最新的3D打印资讯"
        } else if audio_len < 50_000 {
            "帮我写一篇关于航空航天3D打印应用的技术分析文章"
        } else {
            "我需要一份完整的增材制造行业调研报告，包括技术发展、市场现状和投资机会分析"
        };

        format!("{}{}", STREAM_PREFIX, phrase)
    }
}
