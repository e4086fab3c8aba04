use std::fmt;
use std::num::NonZeroU32;

/// プレビューセッション識別子（世代番号付き）
/// - instance: プレビュー表示領域ごとの番号
/// - generation: セッション生成ごとに増える世代番号（破棄済みセッションとの区別用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId {
    instance: u32,
    generation: NonZeroU32,
}

impl SessionId {
    /// 新しいSessionIdを作成
    pub fn new(instance: u32, generation: NonZeroU32) -> Self {
        Self {
            instance,
            generation,
        }
    }

    /// インスタンス番号を取得
    #[inline]
    pub fn instance(&self) -> u32 {
        self.instance
    }

    /// 世代番号を取得
    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }

    /// JS用の単純なID変換（上位12bit: instance, 下位20bit: generation）
    #[inline]
    pub fn to_u32(&self) -> u32 {
        let instance_bits = (self.instance & 0xFFF) << 20;
        let generation_bits = self.generation.get() & 0xFFFFF;
        instance_bits | generation_bits
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.instance, self.generation)
    }
}
