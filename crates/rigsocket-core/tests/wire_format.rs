//! Integration tests for the rigsocket-core wire format.
//!
//! These tests drive the public API the way the client does: decode frames
//! exactly as the service sends them, and build outbound frames from raw
//! device readings.

use rigsocket_core::{
    decode_inbound, encode_credentials, encode_status_report,
    protocol::messages::{PayRate, StableField},
    Base58CheckValidator, CredentialValidator, Credentials, DeviceReading, DeviceStatus,
    DeviceType, InboundMessage, StatusReport,
};

fn reading(index: u32, device_type: DeviceType, load: f64, temperature: f64) -> DeviceReading {
    DeviceReading {
        index,
        name: format!("GPU{index}"),
        device_type,
        load,
        temperature,
        fan_speed: 70,
    }
}

#[test]
fn test_single_active_nvidia_device_report() {
    // Arrange: device 0 is an NVIDIA card and is currently mining
    let device = reading(0, DeviceType::Nvidia, 55.4, 61.6);

    // Act
    let status = DeviceStatus::from_reading(&device, true).expect("finite readings");
    let frame = encode_status_report(&StatusReport::new(vec![status])).expect("encode");

    // Assert
    assert_eq!(frame, r#"{"devices":[[0,"GPU0",5,55,62,70]]}"#);
}

#[test]
fn test_report_preserves_inventory_order() {
    let devices = [
        reading(2, DeviceType::Amd, 10.0, 50.0),
        reading(0, DeviceType::Cpu, 99.6, 70.2),
    ];
    let rows: Vec<_> = devices
        .iter()
        .map(|d| DeviceStatus::from_reading(d, false).unwrap())
        .collect();

    let frame = encode_status_report(&StatusReport::new(rows)).unwrap();

    assert_eq!(
        frame,
        r#"{"devices":[[2,"GPU2",6,10,50,70],[0,"GPU0",2,100,70,70]]}"#
    );
}

#[test]
fn test_burn_frame_carries_message_text() {
    let msg = decode_inbound(r#"{"method":"burn","message":"old client"}"#).unwrap();
    assert_eq!(
        msg,
        InboundMessage::Burn {
            message: "old client".to_string()
        }
    );
}

#[test]
fn test_sma_frame_from_service() {
    // Arrange: a captured pricing frame shape with a string-encoded stable list
    let frame = r#"{"method":"sma","data":[[5,"0.00000123"],[20,"0.0427"]],"stable":"[5,20]"}"#;

    // Act
    let msg = decode_inbound(frame).unwrap();

    // Assert
    let InboundMessage::Sma { rates, stable } = msg else {
        panic!("expected sma");
    };
    assert_eq!(
        rates,
        vec![
            PayRate {
                algorithm: 5,
                paying: 0.00000123
            },
            PayRate {
                algorithm: 20,
                paying: 0.0427
            },
        ]
    );
    assert_eq!(stable, StableField::Algorithms(vec![5, 20]));
}

#[test]
fn test_valid_credentials_encode_to_wire_shape() {
    // Arrange
    let creds = Credentials::new("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", "rig7");

    // Act
    let valid = Base58CheckValidator.validate(&creds);
    let frame = encode_credentials(&creds).unwrap();

    // Assert
    assert!(valid.is_ok());
    assert_eq!(
        frame,
        r#"{"btc":"3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy","worker":"rig7"}"#
    );
}
