use crate::db_types::{Category, NewProduct, Paise};

const TEE_DESCRIPTION: &str = "100% Cotton • Bio Washed • Silicon Washed • French Terry Finish Inside • 240 GSM";
const TEE_SIZES: [&str; 6] = ["XS", "S", "M", "L", "XL", "XXL"];
const IMAGE_BASE: &str = "https://res.cloudinary.com/dhi41qihj/image/upload";

fn basic_tee(colour: &str, images: [&str; 3]) -> NewProduct {
    NewProduct::new(format!("NINEHOOD BASIC TEE - {colour}"), Paise::from_rupees(999), Category::Men)
        .with_images(images.iter().map(|i| format!("{IMAGE_BASE}/{i}")))
        .with_badge("NEW")
        .with_description(TEE_DESCRIPTION)
        .with_stock(50)
        .with_sizes(TEE_SIZES)
}

/// The built-in catalog used to seed an empty store.
pub fn default_catalog() -> Vec<NewProduct> {
    vec![
        basic_tee("BLACK", ["v1760878912/7_q2ttva.png", "v1760878911/8_nnqi64.png", "v1760878912/9_tymgwg.png"]),
        basic_tee("WHITE", ["v1760878911/10_o948qh.png", "v1760878911/11_v99m5g.png", "v1760878912/12_o5zzjm.png"]),
        basic_tee("OLIVE GREEN", [
            "v1760878912/13_by38h2.png",
            "v1760878912/14_kcmg4u.png",
            "v1760878913/15_ahmrrz.png",
        ]),
        NewProduct::new("Urban Cap", Paise::from_rupees(799), Category::Accessories).with_stock(100),
    ]
}
