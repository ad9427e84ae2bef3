use crate::{
    api::GenerationRequest,
    session::SessionToken,
    view::{Effect, Label, SelectGroup},
};

const GENRES: &[&str] = &["Поп", "Рок", "Джаз", "Классика", "Ambient"];
const MOODS: &[&str] = &["Радость", "Грусть", "Энергия", "Спокойствие", "Романтика"];
const INSTRUMENTS: &[&str] = &["Электронные", "Акустические", "Оркестровые"];

const PRESETS: &[Preset] = &[
    Preset {
        title: "Вечеринка",
        genre: "Поп",
        mood: "Энергия",
    },
    Preset {
        title: "Релакс",
        genre: "Ambient",
        mood: "Спокойствие",
    },
    Preset {
        title: "Саундтрек",
        genre: "Классика",
        mood: "Грусть",
    },
    Preset {
        title: "Драйв",
        genre: "Рок",
        mood: "Энергия",
    },
];

pub const LENGTH_MINUTES: (u32, u32, u32) = (1, 10, 2);
pub const TEMPO_BPM: (u32, u32, u32) = (60, 200, 120);

/// Shortcut card that fills genre and mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preset {
    pub title: &'static str,
    pub genre: &'static str,
    pub mood: &'static str,
}

/// Single-select cluster: at most one option is active.
#[derive(Debug, Clone, PartialEq)]
pub struct ChipGroup {
    group: SelectGroup,
    options: Vec<String>,
    active: Option<usize>,
}

impl ChipGroup {
    pub fn new(group: SelectGroup, options: &[&str]) -> Self {
        Self {
            group,
            options: options.iter().map(|option| option.to_string()).collect(),
            active: None,
        }
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    /// Text of the active option, if any and not blank.
    pub fn selected(&self) -> Option<&str> {
        self.active
            .and_then(|index| self.options.get(index))
            .map(|option| option.trim())
            .filter(|option| !option.is_empty())
    }

    pub fn position(&self, value: &str) -> Option<usize> {
        let wanted = value.trim().to_lowercase();
        self.options
            .iter()
            .position(|option| option.trim().to_lowercase() == wanted)
    }

    /// Clicks outside the option range are ignored, like clicks between chips.
    fn select(&mut self, index: usize) -> Option<Effect> {
        if index >= self.options.len() {
            return None;
        }
        self.active = Some(index);
        Some(Effect::Select {
            group: self.group,
            index,
        })
    }
}

/// Bounded integer slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slider {
    min: u32,
    max: u32,
    value: u32,
}

impl Slider {
    pub fn new((min, max, value): (u32, u32, u32)) -> Self {
        Self {
            min,
            max,
            value: value.clamp(min, max),
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    fn set(&mut self, raw: i64) -> u32 {
        self.value = raw.clamp(i64::from(self.min), i64::from(self.max)) as u32;
        self.value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FormEvent {
    ChipClicked { group: SelectGroup, index: usize },
    PresetClicked(usize),
    LengthInput(i64),
    TempoInput(i64),
    DescriptionInput(String),
}

/// Why a submission never reached the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MissingSelection,
    Unauthenticated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationForm {
    genre: ChipGroup,
    mood: ChipGroup,
    instrument: ChipGroup,
    presets: Vec<Preset>,
    active_preset: Option<usize>,
    length: Slider,
    tempo: Slider,
    description: String,
}

impl Default for GenerationForm {
    fn default() -> Self {
        Self {
            genre: ChipGroup::new(SelectGroup::Genre, GENRES),
            mood: ChipGroup::new(SelectGroup::Mood, MOODS),
            instrument: ChipGroup::new(SelectGroup::Instrument, INSTRUMENTS),
            presets: PRESETS.to_vec(),
            active_preset: None,
            length: Slider::new(LENGTH_MINUTES),
            tempo: Slider::new(TEMPO_BPM),
            description: String::new(),
        }
    }
}

impl GenerationForm {
    pub fn group(&self, group: SelectGroup) -> Option<&ChipGroup> {
        match group {
            SelectGroup::Genre => Some(&self.genre),
            SelectGroup::Mood => Some(&self.mood),
            SelectGroup::Instrument => Some(&self.instrument),
            SelectGroup::Preset => None,
        }
    }

    fn group_mut(&mut self, group: SelectGroup) -> Option<&mut ChipGroup> {
        match group {
            SelectGroup::Genre => Some(&mut self.genre),
            SelectGroup::Mood => Some(&mut self.mood),
            SelectGroup::Instrument => Some(&mut self.instrument),
            SelectGroup::Preset => None,
        }
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    pub fn active_preset(&self) -> Option<usize> {
        self.active_preset
    }

    pub fn length(&self) -> Slider {
        self.length
    }

    pub fn tempo(&self) -> Slider {
        self.tempo
    }

    /// Apply one UI event and report what the page has to redraw.
    pub fn handle(mut self, event: FormEvent) -> (Self, Vec<Effect>) {
        let mut effects = Vec::new();
        match event {
            FormEvent::ChipClicked {
                group: SelectGroup::Preset,
                index,
            }
            | FormEvent::PresetClicked(index) => self.apply_preset(index, &mut effects),
            FormEvent::ChipClicked { group, index } => {
                effects.extend(self.click(group, index));
            }
            FormEvent::LengthInput(raw) => {
                let minutes = self.length.set(raw);
                effects.push(Effect::SetLabel {
                    label: Label::Length,
                    text: duration_label(minutes),
                });
            }
            FormEvent::TempoInput(raw) => {
                let bpm = self.tempo.set(raw);
                effects.push(Effect::SetLabel {
                    label: Label::Tempo,
                    text: tempo_label(bpm),
                });
            }
            FormEvent::DescriptionInput(text) => self.description = text,
        }
        (self, effects)
    }

    fn click(&mut self, group: SelectGroup, index: usize) -> Option<Effect> {
        self.group_mut(group).and_then(|chips| chips.select(index))
    }

    fn apply_preset(&mut self, index: usize, effects: &mut Vec<Effect>) {
        let Some(preset) = self.presets.get(index).copied() else {
            return;
        };
        self.active_preset = Some(index);
        effects.push(Effect::Select {
            group: SelectGroup::Preset,
            index,
        });

        // presets go through the same click path as the chips themselves
        if let Some(position) = self.genre.position(preset.genre) {
            effects.extend(self.click(SelectGroup::Genre, position));
        }
        if let Some(position) = self.mood.position(preset.mood) {
            effects.extend(self.click(SelectGroup::Mood, position));
        }
    }

    /// Validate locally and freeze the form into a request value.
    pub fn build_request(&self, token: Option<SessionToken>) -> Result<GenerationRequest, Rejection> {
        let (Some(genre), Some(mood), Some(instrument)) = (
            self.genre.selected(),
            self.mood.selected(),
            self.instrument.selected(),
        ) else {
            return Err(Rejection::MissingSelection);
        };
        let session_id = token.ok_or(Rejection::Unauthenticated)?;

        Ok(GenerationRequest {
            genre: genre.to_string(),
            mood: mood.to_string(),
            instrument: instrument.to_string(),
            length: self.length.value(),
            tempo: self.tempo.value(),
            description: self.description.trim().to_string(),
            session_id,
        })
    }
}

pub fn minutes_word(minutes: u32) -> &'static str {
    match minutes {
        1 => "минута",
        2..=4 => "минуты",
        _ => "минут",
    }
}

pub fn duration_label(minutes: u32) -> String {
    format!("{minutes} {}", minutes_word(minutes))
}

pub fn tempo_label(bpm: u32) -> String {
    format!("{bpm} BPM")
}
