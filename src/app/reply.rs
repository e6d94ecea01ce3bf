#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedColor {
    Blue,
    Gold,
    Green,
    Purple,
}

impl EmbedColor {
    pub fn rgb(self) -> u32 {
        match self {
            EmbedColor::Blue => 0x3498db,
            EmbedColor::Gold => 0xf1c40f,
            EmbedColor::Green => 0x2ecc71,
            EmbedColor::Purple => 0x9b59b6,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Embed {
    pub title: String,
    pub description: Option<String>,
    pub color: EmbedColor,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: EmbedColor) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: false,
        });
        self
    }
}

/// Platform-neutral response to one command.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub content: Option<String>,
    pub embed: Option<Embed>,
    /// Shown only to the caller.
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            ephemeral: false,
        }
    }

    pub fn private(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embed: None,
            ephemeral: true,
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embed: Some(embed),
            ephemeral: false,
        }
    }

    /// Terminal rendering used by the CLI host.
    pub fn to_plain_text(&self) -> String {
        let mut lines = Vec::new();
        if let Some(content) = &self.content {
            lines.push(content.clone());
        }
        if let Some(embed) = &self.embed {
            lines.push(format!("== {} ==", embed.title));
            if let Some(description) = &embed.description {
                lines.push(description.clone());
            }
            for field in &embed.fields {
                lines.push(format!("{}: {}", field.name, field.value));
            }
        }
        lines.join("\n")
    }
}

/// Scores keep one decimal when whole (`8.0`) and full precision otherwise (`7.25`).
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.1}", score)
    } else {
        format!("{}", score)
    }
}
