use tracing::debug;

use crate::device::{DeviceKind, DeviceSnapshot};

/// Consumes snapshots and keeps one selectable list per device kind
pub trait OptionProjector: Send {
    /// Rebuild every list from `snapshot`, keeping the previous choice of
    /// each list when its value is still offered
    fn project(&mut self, snapshot: &DeviceSnapshot);

    fn selected(&self, kind: DeviceKind) -> Option<&str>;

    /// Select `value` if it is offered; returns whether it was
    fn select(&mut self, kind: DeviceKind, value: &str) -> bool;

    /// Jump back to the first entry, which is the platform default
    fn select_default(&mut self, kind: DeviceKind);

    /// Disable the output list when the render target cannot route audio
    fn set_output_disabled(&mut self, disabled: bool);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

/// One drop-down list
#[derive(Debug, Clone, Default)]
pub struct Selector {
    options: Vec<SelectOption>,
    selected: Option<usize>,
    preferred: Option<String>,
    disabled: bool,
}

impl Selector {
    pub fn options(&self) -> &[SelectOption] {
        &self.options
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    /// Value of the selected option. Before the first projection this is the
    /// preferred value, if one was configured.
    pub fn value(&self) -> Option<&str> {
        match self.selected {
            Some(index) => self.options.get(index).map(|o| o.value.as_str()),
            None if self.options.is_empty() => self.preferred.as_deref(),
            None => None,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    fn set_value(&mut self, value: &str) -> bool {
        match self.options.iter().position(|o| o.value == value) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    fn rebuild(&mut self, options: Vec<SelectOption>) {
        let previous = self.value().map(str::to_string);
        self.options = options;
        self.selected = if self.options.is_empty() { None } else { Some(0) };
        self.preferred = None;

        if let Some(value) = previous {
            self.set_value(&value);
        }
    }
}

/// The three device selectors of the harness
#[derive(Debug, Clone, Default)]
pub struct DeviceSelectors {
    audio_input: Selector,
    audio_output: Selector,
    video_input: Selector,
}

impl DeviceSelectors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a selector with a value to restore on the first projection
    pub fn with_preferred(mut self, kind: DeviceKind, value: Option<String>) -> Self {
        self.selector_mut(kind).preferred = value.filter(|v| !v.is_empty());
        self
    }

    pub fn selector(&self, kind: DeviceKind) -> &Selector {
        match kind {
            DeviceKind::AudioInput => &self.audio_input,
            DeviceKind::AudioOutput => &self.audio_output,
            DeviceKind::VideoInput => &self.video_input,
        }
    }

    fn selector_mut(&mut self, kind: DeviceKind) -> &mut Selector {
        match kind {
            DeviceKind::AudioInput => &mut self.audio_input,
            DeviceKind::AudioOutput => &mut self.audio_output,
            DeviceKind::VideoInput => &mut self.video_input,
        }
    }
}

impl OptionProjector for DeviceSelectors {
    fn project(&mut self, snapshot: &DeviceSnapshot) {
        for kind in DeviceKind::ALL {
            let options: Vec<SelectOption> = snapshot
                .of_kind(kind)
                .enumerate()
                .map(|(index, device)| SelectOption {
                    value: device.device_id.clone(),
                    text: if device.label.is_empty() {
                        format!("{} {}", kind.fallback_noun(), index + 1)
                    } else {
                        device.label.clone()
                    },
                })
                .collect();
            debug!("Projected {} {} options", options.len(), kind);
            self.selector_mut(kind).rebuild(options);
        }
    }

    fn selected(&self, kind: DeviceKind) -> Option<&str> {
        self.selector(kind).value()
    }

    fn select(&mut self, kind: DeviceKind, value: &str) -> bool {
        self.selector_mut(kind).set_value(value)
    }

    fn select_default(&mut self, kind: DeviceKind) {
        let selector = self.selector_mut(kind);
        selector.selected = if selector.options.is_empty() {
            None
        } else {
            Some(0)
        };
        selector.preferred = None;
    }

    fn set_output_disabled(&mut self, disabled: bool) {
        self.audio_output.disabled = disabled;
    }
}
