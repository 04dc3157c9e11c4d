use crate::run_state::RunState;

//tilt angle of the stand in degrees, as reported by the MCU.
pub type TiltAngle = f64;

//A single range reading within a 2D scan
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeReading{
    //distance in meters
    pub range: f32,
    //return intensity, when the sensor provides one
    pub intensity: Option<f32>,
}

impl RangeReading{
    pub fn new(range: f32) -> Self{
        Self{
            range,
            intensity: None,
        }
    }

    pub fn with_intensity(range: f32, intensity: f32) -> Self{
        Self{
            range,
            intensity: Some(intensity),
        }
    }
}

//one complete 2D range scan. Replaced wholesale on every arrival.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RangeSample{
    //bearing of the first reading, radians
    pub angle_min: f32,
    //bearing step between consecutive readings, radians
    pub angle_increment: f32,
    pub readings: Vec<RangeReading>,
    //capture time in milliseconds since the Unix epoch
    pub timestamp_ms: u64,
}

impl RangeSample{
    pub fn new(angle_min: f32, angle_increment: f32, readings: Vec<RangeReading>) -> Self{
        Self{
            angle_min,
            angle_increment,
            readings,
            timestamp_ms: 0,
        }
    }

    pub fn with_timestamp(mut self, timestamp_ms: u64) -> Self{
        self.timestamp_ms = timestamp_ms;
        self
    }

    pub fn sample_count(&self) -> usize{
        self.readings.len()
    }

    //bearing of the last reading, radians
    pub fn angle_max(&self) -> f32{
        match self.readings.len(){
            0 => self.angle_min,
            n => self.angle_min + self.angle_increment * (n - 1) as f32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Slice{
    //position of this slice in the run, starting at 1
    pub sequence: u64,
    pub tilt_angle: TiltAngle,
    pub scan: RangeSample,
    //run state at the moment the slice was packaged
    pub run_state: RunState,
}
