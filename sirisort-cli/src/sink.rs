//! Default sorting routine: multiplicities and raw spectra.

use sirisort_core::Event;
use sirisort_hist::{AxisSpec, Hist1D, Hist2D, HistogramRegistry};
use sirisort_io::EventSink;

const ADC_BINS: usize = 4096;
const ADC_RANGE: f64 = 65536.0;

/// Fills uncalibrated overview histograms for every event.
pub struct MultiplicitySink {
    registry: HistogramRegistry,
    mult_e: Hist1D,
    mult_de: Hist1D,
    mult_na: Hist1D,
    e_adc: Hist1D,
    de_adc: Hist1D,
    na_adc: Hist1D,
    na_tdc: Hist1D,
    e_de: Hist2D,
}

impl MultiplicitySink {
    pub fn new(registry: HistogramRegistry) -> Self {
        let mut registry = registry;
        let mult = |max: usize| AxisSpec::new(max + 1, -0.5, max as f64 + 0.5, "multiplicity");
        let adc = || AxisSpec::new(ADC_BINS, 0.0, ADC_RANGE, "ADC channel");

        let mult_e = registry.create_1d("h_mult_e", "SiRi back multiplicity", mult(Event::MAX_E));
        let mult_de = registry.create_1d("h_mult_de", "SiRi front multiplicity", mult(Event::MAX_DE));
        let mult_na = registry.create_1d("h_mult_na", "CACTUS multiplicity", mult(Event::MAX_NA));
        let e_adc = registry.create_1d("h_e_adc", "SiRi back ADC, all channels", adc());
        let de_adc = registry.create_1d("h_de_adc", "SiRi front ADC, all channels", adc());
        let na_adc = registry.create_1d("h_na_adc", "CACTUS ADC, all channels", adc());
        let na_tdc = registry.create_1d("h_na_tdc", "CACTUS TDC, all channels", adc());
        let e_de = registry.create_2d(
            "m_e_de",
            "SiRi front vs back ADC",
            AxisSpec::new(512, 0.0, ADC_RANGE, "back ADC"),
            AxisSpec::new(512, 0.0, ADC_RANGE, "front ADC"),
        );

        Self {
            registry,
            mult_e,
            mult_de,
            mult_na,
            e_adc,
            de_adc,
            na_adc,
            na_tdc,
            e_de,
        }
    }

    pub fn into_registry(mut self) -> HistogramRegistry {
        self.registry.flush_all();
        self.registry
    }
}

impl EventSink for MultiplicitySink {
    fn sort(&mut self, event: &Event) {
        let reg = &mut self.registry;
        reg.fill_1d(self.mult_e, event.e.len() as f64, 1.0);
        reg.fill_1d(self.mult_de, event.de.len() as f64, 1.0);
        reg.fill_1d(self.mult_na, event.na.len() as f64, 1.0);

        for e in event.e.iter() {
            reg.fill_1d(self.e_adc, f64::from(e.adc), 1.0);
        }
        for de in event.de.iter() {
            reg.fill_1d(self.de_adc, f64::from(de.adc), 1.0);
        }
        for na in event.na.iter() {
            reg.fill_1d(self.na_adc, f64::from(na.adc), 1.0);
            reg.fill_1d(self.na_tdc, f64::from(na.tdc), 1.0);
        }
        // Only clean single-hit particle events go into the matrix.
        if let ([e], [de]) = (event.e.as_slice(), event.de.as_slice()) {
            reg.fill_2d(self.e_de, f64::from(e.adc), f64::from(de.adc), 1.0);
        }
    }
}
