/// Tests for engine error types

use super::*;

#[test]
fn test_display_not_initialised() {
    let err = Error::NotInitialised("Collision system");
    assert_eq!(err.to_string(), "Collision system not initialised");
}

#[test]
fn test_display_out_of_bounds() {
    let err = Error::OutOfBounds(1.5, -2.0);
    assert_eq!(err.to_string(), "Point (1.5, -2) out of bounds");
}

#[test]
fn test_display_light_capacity() {
    let err = Error::LightCapacityExceeded(4);
    assert_eq!(err.to_string(), "Exceeded maximum of 4 lights per frame");
}

#[test]
fn test_display_unknown_resource() {
    let err = Error::UnknownResource(42);
    assert_eq!(err.to_string(), "Unknown resource id: 42");
}

#[test]
fn test_error_trait_object() {
    // Errors must be usable as boxed std errors
    let err: Box<dyn std::error::Error> = Box::new(Error::OutsideAllVolumes);
    assert!(err.to_string().contains("collision volume"));
}

#[test]
fn test_result_propagation() {
    fn fails() -> Result<()> {
        Err(Error::FeatureSetUncompiled)
    }
    fn propagates() -> Result<()> {
        fails()?;
        Ok(())
    }
    assert!(matches!(propagates(), Err(Error::FeatureSetUncompiled)));
}
