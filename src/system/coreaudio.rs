use anyhow::{Result, bail};
use core_foundation_sys::runloop::CFRunLoopRef;
use coreaudio_sys::*;
use std::os::raw::c_void;
use std::ptr;
use tracing::{debug, info, warn};

use crate::system::traits::{ChangeCallback, DeviceChangeSource};

/// Native device-list notifications from the CoreAudio HAL
pub struct CoreAudioDeviceWatcher {
    device_list_address: AudioObjectPropertyAddress,
}

impl CoreAudioDeviceWatcher {
    pub fn new() -> Self {
        Self {
            device_list_address: AudioObjectPropertyAddress {
                mSelector: kAudioHardwarePropertyDevices,
                mScope: kAudioObjectPropertyScopeGlobal,
                mElement: kAudioObjectPropertyElementMain,
            },
        }
    }

    /// Let the HAL deliver notifications on its own thread instead of
    /// the main run loop, which this process never runs.
    fn detach_from_main_run_loop() {
        let address = AudioObjectPropertyAddress {
            mSelector: kAudioHardwarePropertyRunLoop,
            mScope: kAudioObjectPropertyScopeGlobal,
            mElement: kAudioObjectPropertyElementMain,
        };
        let run_loop: CFRunLoopRef = ptr::null_mut();

        let status = unsafe {
            AudioObjectSetPropertyData(
                kAudioObjectSystemObject,
                &address,
                0,
                ptr::null(),
                std::mem::size_of::<CFRunLoopRef>() as UInt32,
                &run_loop as *const CFRunLoopRef as *const c_void,
            )
        };
        if status != kAudioHardwareNoError as i32 {
            warn!("Could not detach HAL notifications from the main run loop: {}", status);
        }
    }
}

impl Default for CoreAudioDeviceWatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceChangeSource for CoreAudioDeviceWatcher {
    fn supports_device_change(&self) -> bool {
        true
    }

    /// The callback stays registered for the lifetime of the process
    fn subscribe(&self, callback: ChangeCallback) -> Result<()> {
        Self::detach_from_main_run_loop();

        let client_data = Box::into_raw(Box::new(callback)) as *mut c_void;
        let status = unsafe {
            AudioObjectAddPropertyListener(
                kAudioObjectSystemObject,
                &self.device_list_address,
                Some(device_list_listener),
                client_data,
            )
        };

        if status != kAudioHardwareNoError as i32 {
            // Not registered, so nothing else holds the pointer
            drop(unsafe { Box::from_raw(client_data as *mut ChangeCallback) });
            bail!("Failed to register device list listener: {}", status);
        }

        info!("CoreAudio device list listener registered");
        Ok(())
    }
}

extern "C" fn device_list_listener(
    _in_object_id: AudioObjectID,
    _in_number_addresses: UInt32,
    _in_addresses: *const AudioObjectPropertyAddress,
    in_client_data: *mut c_void,
) -> OSStatus {
    if !in_client_data.is_null() {
        debug!("CoreAudio device list changed");
        let callback = unsafe { &*(in_client_data as *const ChangeCallback) };
        callback();
    }
    kAudioHardwareNoError as i32
}
