//! Bluetooth UUIDs and manufacturer IDs for the sensors airlog talks to.

use uuid::{Uuid, uuid};

// --- Saf Tehnika (Aranet) Service UUIDs ---

/// Saf Tehnika custom service UUID for firmware v1.2.0 and newer.
pub const ARANET_SERVICE_NEW: Uuid = uuid!("0000fce0-0000-1000-8000-00805f9b34fb");

/// Saf Tehnika custom service UUID for firmware versions before v1.2.0.
pub const ARANET_SERVICE_OLD: Uuid = uuid!("f0cd1400-95da-4f4b-9ac8-aa55d312af0c");

/// Saf Tehnika manufacturer ID for BLE advertisements.
pub const ARANET_MANUFACTURER_ID: u16 = 0x0702;

/// Apple manufacturer ID. Eve accessories advertise under this company ID.
pub const APPLE_MANUFACTURER_ID: u16 = 0x004C;

// --- Aranet Characteristic UUIDs ---

/// Current readings characteristic (detailed, 13-byte payload).
pub const CURRENT_READINGS_DETAIL: Uuid = uuid!("f0cd3001-95da-4f4b-9ac8-aa55d312af0c");

/// Total number of readings stored in device memory.
pub const TOTAL_READINGS: Uuid = uuid!("f0cd2001-95da-4f4b-9ac8-aa55d312af0c");

/// Measurement interval in seconds.
pub const READ_INTERVAL: Uuid = uuid!("f0cd2002-95da-4f4b-9ac8-aa55d312af0c");

/// History data characteristic (version 2) - read-based.
pub const HISTORY_V2: Uuid = uuid!("f0cd2005-95da-4f4b-9ac8-aa55d312af0c");

/// Command characteristic for device control.
pub const COMMAND: Uuid = uuid!("f0cd1402-95da-4f4b-9ac8-aa55d312af0c");

/// Seconds since last measurement.
pub const SECONDS_SINCE_UPDATE: Uuid = uuid!("f0cd2004-95da-4f4b-9ac8-aa55d312af0c");

// --- Standard BLE Characteristic UUIDs ---

/// Battery level characteristic.
pub const BATTERY_LEVEL: Uuid = uuid!("00002a19-0000-1000-8000-00805f9b34fb");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aranet_service_uuids() {
        assert_eq!(
            ARANET_SERVICE_NEW.to_string(),
            "0000fce0-0000-1000-8000-00805f9b34fb"
        );
        assert_eq!(
            ARANET_SERVICE_OLD.to_string(),
            "f0cd1400-95da-4f4b-9ac8-aa55d312af0c"
        );
        assert_ne!(ARANET_SERVICE_NEW, ARANET_SERVICE_OLD);
    }

    #[test]
    fn test_manufacturer_ids() {
        assert_eq!(ARANET_MANUFACTURER_ID, 0x0702);
        assert_eq!(APPLE_MANUFACTURER_ID, 76);
    }

    #[test]
    fn test_current_readings_detail_uuid() {
        assert_eq!(
            CURRENT_READINGS_DETAIL.to_string(),
            "f0cd3001-95da-4f4b-9ac8-aa55d312af0c"
        );
    }

    #[test]
    fn test_history_uuids() {
        assert_eq!(
            HISTORY_V2.to_string(),
            "f0cd2005-95da-4f4b-9ac8-aa55d312af0c"
        );
        assert_eq!(COMMAND.to_string(), "f0cd1402-95da-4f4b-9ac8-aa55d312af0c");
        assert_eq!(
            TOTAL_READINGS.to_string(),
            "f0cd2001-95da-4f4b-9ac8-aa55d312af0c"
        );
        assert_eq!(
            READ_INTERVAL.to_string(),
            "f0cd2002-95da-4f4b-9ac8-aa55d312af0c"
        );
        assert_eq!(
            SECONDS_SINCE_UPDATE.to_string(),
            "f0cd2004-95da-4f4b-9ac8-aa55d312af0c"
        );
    }

    #[test]
    fn test_battery_level_uuid() {
        assert_eq!(
            BATTERY_LEVEL.to_string(),
            "00002a19-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_aranet_characteristic_prefix() {
        // All Aranet-specific characteristics start with f0cd
        let aranet_uuids = [
            CURRENT_READINGS_DETAIL,
            TOTAL_READINGS,
            READ_INTERVAL,
            HISTORY_V2,
            COMMAND,
            SECONDS_SINCE_UPDATE,
        ];

        for uuid in aranet_uuids {
            assert!(
                uuid.to_string().starts_with("f0cd"),
                "UUID {} should start with f0cd",
                uuid
            );
        }
    }
}
