use tracing::info;

use crate::device::DeviceDescriptor;

const SHORT_DEVICE_ID: usize = 7;
const SHORT_GROUP_ID: usize = 5;

/// How device and group ids are rendered in log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IdFormat {
    #[default]
    Full,
    Short,
}

impl IdFormat {
    pub fn from_short(short: bool) -> Self {
        if short { IdFormat::Short } else { IdFormat::Full }
    }

    pub fn device_id<'a>(&self, id: &'a str) -> &'a str {
        match self {
            IdFormat::Full => id,
            IdFormat::Short => prefix(id, SHORT_DEVICE_ID),
        }
    }

    pub fn group_id<'a>(&self, id: &'a str) -> &'a str {
        match self {
            IdFormat::Full => id,
            IdFormat::Short => prefix(id, SHORT_GROUP_ID),
        }
    }
}

fn prefix(s: &str, chars: usize) -> &str {
    match s.char_indices().nth(chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Log one line per descriptor
pub fn log_devices<'a>(
    heading: &str,
    devices: impl IntoIterator<Item = &'a DeviceDescriptor>,
    ids: IdFormat,
) {
    info!("{}", heading);
    for device in devices {
        info!(
            kind = %device.kind,
            group_id = ids.group_id(&device.group_id),
            device_id = ids.device_id(&device.device_id),
            label = %device.label,
            "  [{}]",
            device.kind
        );
    }
}
