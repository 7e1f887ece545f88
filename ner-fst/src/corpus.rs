//! # Textos de Demonstração
//!
//! Pequenos textos em húngaro que exercitam cada categoria do conjunto padrão.
//! Usados pela interface web e pelos testes de ponta a ponta.

/// (domínio, texto)
pub fn demo_texts() -> Vec<(&'static str, &'static str)> {
    vec![
        (
            "Contato",
            "Kovács János ügyfélszolgálata hétköznap hívható a +36201234567 számon, vagy írjon a kovacs.janos@example.com címre. Részletek: https://example.hu/kapcsolat",
        ),
        (
            "Endereço",
            "Az iroda címe 1051 Budapest, Kossuth Lajos utca 12. A levelezési irányítószám H-1364, a fióktelep Debrecen városában van.",
        ),
        (
            "Comércio",
            "A csomag ára 1500 forint volt, a kiszállítás 990Ft, külföldre $20. A kedvezmény 25% és a raktárban 1.000.000 darab maradt.",
        ),
        (
            "Agenda",
            "Nagy Éva 2024.12.10 napon érkezik, a visszaút 12/20/2024 dátumra esik. Sürgős ügyben: 06-30/123-4567.",
        ),
        (
            "Ruído",
            "Ebben a mondatban nincs semmi különös, csak hétköznapi szavak.",
        ),
    ]
}
