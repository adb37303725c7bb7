//! Validation-layer message sink. Every diagnostic the driver emits flows
//! through [`debug_callback`] into tracing; the callback never aborts the
//! offending call.

use std::ffi::CStr;
use std::os::raw::c_void;

use ash::ext::debug_utils;
use ash::vk;
use tracing::{debug, error, info, warn};

/// Render one diagnostic as a log line. A null/absent message is an explicit
/// "no message" marker from the driver, not an error; it is shown as `----`.
pub(crate) fn format_debug_message(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    code: i32,
    message: Option<&str>,
) -> String {
    format!(
        "[{:?}][{}] {:?} -> {}",
        severity,
        code,
        types,
        message.unwrap_or("----")
    )
}

pub(crate) unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user: *mut c_void,
) -> vk::Bool32 {
    let (code, message) = if data.is_null() {
        (0, None)
    } else {
        let data = &*data;
        let message = if data.p_message.is_null() {
            None
        } else {
            CStr::from_ptr(data.p_message).to_str().ok()
        };
        (data.message_id_number, message)
    };

    let line = format_debug_message(severity, types, code, message);
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        error!("{line}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        warn!("{line}");
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        info!("{line}");
    } else {
        debug!("{line}");
    }

    vk::FALSE
}

pub(crate) unsafe fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
) -> Result<vk::DebugUtilsMessengerEXT, vk::Result> {
    let loader = debug_utils::Instance::new(entry, instance);
    let ci = vk::DebugUtilsMessengerCreateInfoEXT {
        s_type: vk::StructureType::DEBUG_UTILS_MESSENGER_CREATE_INFO_EXT,
        message_severity: vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
            | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        message_type: vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        pfn_user_callback: Some(debug_callback),
        ..Default::default()
    };
    loader.create_debug_utils_messenger(&ci, None)
}

pub(crate) unsafe fn destroy_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    messenger: vk::DebugUtilsMessengerEXT,
) {
    let loader = debug_utils::Instance::new(entry, instance);
    loader.destroy_debug_utils_messenger(messenger, None);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_severity_code_type_and_message() {
        let line = format_debug_message(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
            vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
            42,
            Some("image layout mismatch"),
        );
        assert!(line.contains("42"));
        assert!(line.ends_with("image layout mismatch"));
    }

    #[test]
    fn absent_message_renders_the_no_message_marker() {
        let line = format_debug_message(
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
            0,
            None,
        );
        assert!(line.ends_with("----"));
    }
}
