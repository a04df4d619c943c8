mod math_property_tests;
mod pool_property_tests;
